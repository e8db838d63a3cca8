use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "murmur",
    about = "Murmur — a small social network kept in a local data directory",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the durable slots (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file (default: ./murmur.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in, creating the account on first use
    Login(EmailArgs),
    /// Register an account and sign in
    Signup(EmailArgs),
    /// End the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or edit a profile
    Profile(ProfileArgs),
    /// Add or remove education entries
    Education(EducationArgs),
    /// Add or remove work experience entries
    Experience(ExperienceArgs),
    /// List all users
    Users,
    /// Publish a post
    Post(PostArgs),
    /// Show a post with its comment threads
    Show(PostRef),
    /// Toggle a like on a post
    Like(PostRef),
    /// Toggle a dislike on a post
    Dislike(PostRef),
    /// Vote in a post's poll
    Vote(VoteArgs),
    /// Count a view of a post
    View(PostRef),
    /// Comment on a post or reply to a comment
    Comment(CommentArgs),
    /// Toggle a like on a comment
    CommentLike(CommentRef),
    /// Toggle a dislike on a comment
    CommentDislike(CommentRef),
    /// Delete one of your comments and its replies
    CommentDelete(CommentRef),
    /// Follow or unfollow a user
    Follow(UserRef),
    /// List a user's followers and followed users
    Connections(ConnectionsArgs),
    /// Show posts, newest first
    Feed(FeedArgs),
    /// Show the most engaged-with posts
    Trending(TrendingArgs),
    /// Send a direct message
    Send(SendArgs),
    /// List conversations, or all messages with --all
    Inbox(InboxArgs),
    /// Show a conversation and mark it read
    Conversation(UserRef),
    /// List notifications
    Notifications(NotificationsArgs),
    /// Mark notifications read
    Read(ReadArgs),
}

#[derive(Args)]
pub struct EmailArgs {
    pub email: String,
}

/// A user by id, id prefix, handle, username or email.
#[derive(Args)]
pub struct UserRef {
    pub user: String,
}

/// A post by id, id prefix or handle.
#[derive(Args)]
pub struct PostRef {
    pub post: String,
}

#[derive(Args)]
pub struct CommentRef {
    pub post: String,
    pub comment: String,
}

#[derive(Args)]
pub struct ProfileArgs {
    /// User to show (default: the signed-in user)
    pub user: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long, conflicts_with = "clear_avatar")]
    pub avatar: Option<String>,
    #[arg(long)]
    pub clear_avatar: bool,
    #[arg(long)]
    pub bio: Option<String>,
    /// State or region of residence
    #[arg(long)]
    pub state: Option<String>,
    /// Entrance exam being prepared for
    #[arg(long)]
    pub exam: Option<String>,
    /// Mark onboarding as completed
    #[arg(long)]
    pub onboarded: bool,
}

#[derive(Args)]
pub struct EducationArgs {
    #[command(subcommand)]
    pub action: EducationAction,
}

#[derive(Subcommand)]
pub enum EducationAction {
    Add {
        institution: String,
        #[arg(long, default_value = "")]
        degree: String,
        #[arg(long, default_value = "")]
        field: String,
        #[arg(long, default_value = "")]
        start: String,
        #[arg(long, default_value = "")]
        end: String,
        #[arg(long, default_value = "")]
        skills: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Args)]
pub struct ExperienceArgs {
    #[command(subcommand)]
    pub action: ExperienceAction,
}

#[derive(Subcommand)]
pub enum ExperienceAction {
    Add {
        company: String,
        title: String,
        #[arg(long, default_value = "")]
        kind: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        start: String,
        #[arg(long, default_value = "")]
        end: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        skills: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Args)]
pub struct PostArgs {
    #[arg(default_value = "")]
    pub content: String,
    #[arg(long = "image")]
    pub images: Vec<String>,
    #[arg(long = "video")]
    pub videos: Vec<String>,
    #[arg(long, requires = "poll_options")]
    pub poll: Option<String>,
    #[arg(long = "option", requires = "poll")]
    pub poll_options: Vec<String>,
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Args)]
pub struct VoteArgs {
    pub post: String,
    /// Option number, starting at 1
    pub option: u32,
}

#[derive(Args)]
pub struct CommentArgs {
    pub post: String,
    pub content: String,
    /// Comment to reply to
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct ConnectionsArgs {
    /// Default: the signed-in user
    pub user: Option<String>,
}

#[derive(Args)]
pub struct FeedArgs {
    /// Only the signed-in user and the users they follow
    #[arg(long)]
    pub following: bool,
}

#[derive(Args)]
pub struct TrendingArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct SendArgs {
    pub to: String,
    pub content: String,
}

#[derive(Args)]
pub struct InboxArgs {
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct NotificationsArgs {
    #[arg(long)]
    pub unread: bool,
}

#[derive(Args)]
pub struct ReadArgs {
    /// Notification id or id prefix
    #[arg(required_unless_present = "all")]
    pub notification: Option<String>,
    #[arg(long, conflicts_with = "notification")]
    pub all: bool,
}
