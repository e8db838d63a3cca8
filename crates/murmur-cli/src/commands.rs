use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use murmur_graph::{ConversationSummary, SocialGraph};
use murmur_store::{FileSlot, SlotRepository};
use murmur_types::{
    CommentId, CommentThread, EducationItem, ExperienceItem, ItemId, Message, NewPoll, NewPost,
    Notification, NotificationId, PollOptionId, Post, ProfileUpdate, Reaction, User, UserId,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

type Graph = SocialGraph<SlotRepository<FileSlot>>;

pub fn open_graph(data_dir: &Path, config: &CliConfig) -> anyhow::Result<Graph> {
    let slot = FileSlot::open(data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;
    let repo = SlotRepository::open(slot)?;
    debug!(data_dir = %data_dir.display(), "graph opened");
    Ok(SocialGraph::with_config(repo, config.graph.clone()))
}

pub fn run_command(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let ctx = Ctx {
        graph: open_graph(&data_dir, &config)?,
        format: cli.format,
    };
    match cli.command {
        Command::Login(args) => cmd_login(&ctx, args, false),
        Command::Signup(args) => cmd_login(&ctx, args, true),
        Command::Logout => {
            ctx.graph.logout()?;
            ctx.emit(&json!({ "signed_in": false }), |_| println!("Signed out."))
        }
        Command::Whoami => cmd_whoami(&ctx),
        Command::Profile(args) => cmd_profile(&ctx, args),
        Command::Education(args) => cmd_education(&ctx, args),
        Command::Experience(args) => cmd_experience(&ctx, args),
        Command::Users => {
            let users = ctx.graph.get_all_users()?;
            ctx.emit(&users, |users| users.iter().for_each(print_user_line))
        }
        Command::Post(args) => cmd_post(&ctx, args),
        Command::Show(args) => cmd_show(&ctx, args),
        Command::Like(args) => cmd_react(&ctx, args, Reaction::Like),
        Command::Dislike(args) => cmd_react(&ctx, args, Reaction::Dislike),
        Command::Vote(args) => cmd_vote(&ctx, args),
        Command::View(args) => {
            let post = ctx.resolve_post(&args.post)?;
            let views = ctx.graph.record_view(&post.id(), &post.author_id())?;
            ctx.emit(&json!({ "post": post.id(), "views": views }), |_| {
                println!("{} now has {} views", post.id().handle().yellow(), views)
            })
        }
        Command::Comment(args) => cmd_comment(&ctx, args),
        Command::CommentLike(args) => cmd_comment_react(&ctx, args, Reaction::Like),
        Command::CommentDislike(args) => cmd_comment_react(&ctx, args, Reaction::Dislike),
        Command::CommentDelete(args) => {
            let post = ctx.resolve_post(&args.post)?;
            let comment = resolve_comment(&post, &args.comment)?;
            let removed = ctx
                .graph
                .delete_comment(&post.id(), &post.author_id(), &comment)?;
            ctx.emit(&json!({ "comment": comment, "removed": removed }), |_| {
                println!("{} Deleted {} comment(s)", "✓".green(), removed)
            })
        }
        Command::Follow(args) => cmd_follow(&ctx, args),
        Command::Connections(args) => cmd_connections(&ctx, args),
        Command::Feed(args) => {
            let posts = if args.following {
                ctx.graph.following_feed()?
            } else {
                ctx.graph.feed()?
            };
            ctx.emit(&posts, |posts| print_posts(posts))
        }
        Command::Trending(args) => {
            let posts = ctx.graph.trending(args.limit)?;
            ctx.emit(&posts, |posts| print_posts(posts))
        }
        Command::Send(args) => cmd_send(&ctx, args),
        Command::Inbox(args) => cmd_inbox(&ctx, args),
        Command::Conversation(args) => cmd_conversation(&ctx, args),
        Command::Notifications(args) => cmd_notifications(&ctx, args),
        Command::Read(args) => cmd_read(&ctx, args),
    }
}

struct Ctx {
    graph: Graph,
    format: OutputFormat,
}

impl Ctx {
    /// Print `value` as JSON, or hand it to `text` for the human format.
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(value),
        }
        Ok(())
    }

    fn signed_in(&self) -> anyhow::Result<User> {
        self.graph
            .current_user()?
            .ok_or_else(|| anyhow!("not signed in; run `murmur login <email>`"))
    }

    /// Look a user up by full id, id prefix, handle, username or email.
    fn resolve_user(&self, key: &str) -> anyhow::Result<User> {
        let key = key.trim();
        if let Ok(id) = key.parse::<UserId>() {
            return self
                .graph
                .get_user_by_id(&id)?
                .ok_or_else(|| anyhow!("no user with id {id}"));
        }
        let lowered = key.to_lowercase();
        let found: Vec<User> = self
            .graph
            .get_all_users()?
            .into_iter()
            .filter(|u| {
                u.username == key
                    || u.email() == lowered
                    || id_matches(&u.id().to_string(), &lowered)
            })
            .collect();
        pick(found, "user", key)
    }

    /// Find a post anywhere in the graph by id, id prefix or handle.
    fn resolve_post(&self, key: &str) -> anyhow::Result<Post> {
        let key = key.trim().to_lowercase();
        let found: Vec<Post> = self
            .graph
            .feed()?
            .into_iter()
            .filter(|p| id_matches(&p.id().to_string(), &key))
            .collect();
        pick(found, "post", &key)
    }

    fn names(&self) -> anyhow::Result<HashMap<UserId, String>> {
        Ok(self
            .graph
            .get_all_users()?
            .into_iter()
            .map(|u| (u.id(), u.username))
            .collect())
    }
}

/// `key` is a prefix of the full id, or a printed handle (any tail of it).
fn id_matches(id: &str, key: &str) -> bool {
    !key.is_empty() && (id.starts_with(key) || id.ends_with(key))
}

fn pick<T>(mut found: Vec<T>, what: &str, key: &str) -> anyhow::Result<T> {
    match found.len() {
        0 => bail!("no {what} matches '{key}'"),
        1 => Ok(found.remove(0)),
        n => bail!("'{key}' matches {n} {what}s; use the printed handle or the full id"),
    }
}

fn resolve_comment(post: &Post, key: &str) -> anyhow::Result<CommentId> {
    let key = key.trim().to_lowercase();
    let found: Vec<CommentId> = post
        .comments
        .iter()
        .map(|c| c.id())
        .filter(|id| id_matches(&id.to_string(), &key))
        .collect();
    pick(found, "comment", &key)
}

// ---- Session and profile ----

fn cmd_login(ctx: &Ctx, args: EmailArgs, signup: bool) -> anyhow::Result<()> {
    let user = if signup {
        ctx.graph.signup(&args.email)?
    } else {
        ctx.graph.login(&args.email)?
    };
    ctx.emit(&user, |u| {
        println!(
            "{} Signed in as {} ({})",
            "✓".green().bold(),
            u.username.bold(),
            u.id().handle().dimmed()
        )
    })
}

fn cmd_whoami(ctx: &Ctx) -> anyhow::Result<()> {
    match ctx.graph.current_user()? {
        Some(user) => ctx.emit(&user, print_profile),
        None => ctx.emit(&serde_json::Value::Null, |_| println!("Not signed in.")),
    }
}

fn cmd_profile(ctx: &Ctx, args: ProfileArgs) -> anyhow::Result<()> {
    let update = ProfileUpdate {
        username: args.username,
        avatar: if args.clear_avatar {
            Some(None)
        } else {
            args.avatar.map(Some)
        },
        bio: args.bio.map(Some),
        state: args.state.map(Some),
        entrance_exam: args.exam.map(Some),
        onboarding_completed: args.onboarded.then_some(true),
        ..ProfileUpdate::default()
    };
    if !update.is_empty() {
        if args.user.is_some() {
            bail!("only the signed-in user's profile can be edited");
        }
        let user = ctx.graph.update_profile(update)?;
        return ctx.emit(&user, print_profile);
    }
    let user = match args.user {
        Some(key) => ctx.resolve_user(&key)?,
        None => ctx.signed_in()?,
    };
    ctx.emit(&user, print_profile)
}

fn cmd_education(ctx: &Ctx, args: EducationArgs) -> anyhow::Result<()> {
    match args.action {
        EducationAction::Add {
            institution,
            degree,
            field,
            start,
            end,
            skills,
        } => {
            let item = EducationItem {
                id: ItemId::new(),
                institution,
                degree,
                field,
                start_year: start,
                end_year: end,
                skills,
                logo: None,
            };
            ctx.graph.upsert_education(item.clone())?;
            ctx.emit(&item, |e| {
                println!("{} Added {} ({})", "✓".green(), e.institution.bold(), e.id.handle().dimmed())
            })
        }
        EducationAction::Remove { id } => {
            let me = ctx.signed_in()?;
            let key = id.trim().to_lowercase();
            let found: Vec<ItemId> = me
                .education
                .iter()
                .map(|e| e.id)
                .filter(|id| id_matches(&id.to_string(), &key))
                .collect();
            let id = pick(found, "education entry", &key)?;
            let removed = ctx.graph.remove_education(&id)?;
            ctx.emit(&json!({ "removed": removed }), |_| println!("Removed education entry."))
        }
    }
}

fn cmd_experience(ctx: &Ctx, args: ExperienceArgs) -> anyhow::Result<()> {
    match args.action {
        ExperienceAction::Add {
            company,
            title,
            kind,
            location,
            start,
            end,
            description,
            skills,
        } => {
            let item = ExperienceItem {
                id: ItemId::new(),
                company,
                title,
                kind,
                location,
                start_date: start,
                end_date: end,
                description,
                skills,
                logo: None,
            };
            ctx.graph.upsert_experience(item.clone())?;
            ctx.emit(&item, |e| {
                println!(
                    "{} Added {} at {} ({})",
                    "✓".green(),
                    e.title.bold(),
                    e.company.bold(),
                    e.id.handle().dimmed()
                )
            })
        }
        ExperienceAction::Remove { id } => {
            let me = ctx.signed_in()?;
            let key = id.trim().to_lowercase();
            let found: Vec<ItemId> = me
                .experience
                .iter()
                .map(|e| e.id)
                .filter(|id| id_matches(&id.to_string(), &key))
                .collect();
            let id = pick(found, "experience entry", &key)?;
            let removed = ctx.graph.remove_experience(&id)?;
            ctx.emit(&json!({ "removed": removed }), |_| println!("Removed experience entry."))
        }
    }
}

// ---- Posts and comments ----

#[derive(Serialize)]
struct PostView<'a> {
    post: &'a Post,
    threads: Vec<CommentThread>,
}

fn cmd_post(ctx: &Ctx, args: PostArgs) -> anyhow::Result<()> {
    let draft = NewPost {
        content: args.content,
        images: args.images,
        videos: args.videos,
        poll: args.poll.map(|question| NewPoll {
            question,
            options: args.poll_options,
        }),
        location: args.location,
    };
    let post = ctx.graph.create_post(draft)?;
    ctx.emit(&post, |p| {
        println!("{} Posted {}", "✓".green().bold(), p.id().handle().yellow())
    })
}

fn cmd_show(ctx: &Ctx, args: PostRef) -> anyhow::Result<()> {
    let post = ctx.resolve_post(&args.post)?;
    let view = PostView {
        post: &post,
        threads: post.comments.threads(),
    };
    ctx.emit(&view, |v| {
        print_post(v.post);
        for thread in &v.threads {
            print_thread(thread, 1);
        }
    })
}

fn cmd_react(ctx: &Ctx, args: PostRef, reaction: Reaction) -> anyhow::Result<()> {
    let post = ctx.resolve_post(&args.post)?;
    let outcome = match reaction {
        Reaction::Like => ctx.graph.toggle_post_like(&post.id(), &post.author_id())?,
        Reaction::Dislike => ctx.graph.toggle_post_dislike(&post.id(), &post.author_id())?,
    };
    ctx.emit(&json!({ "post": post.id(), "reaction": outcome }), |_| {
        print_reaction(outcome, reaction)
    })
}

fn cmd_vote(ctx: &Ctx, args: VoteArgs) -> anyhow::Result<()> {
    let post = ctx.resolve_post(&args.post)?;
    let option = PollOptionId(args.option);
    let votes = ctx.graph.vote_poll(&post.id(), &post.author_id(), option)?;
    ctx.emit(&json!({ "post": post.id(), "option": option, "votes": votes }), |_| {
        println!("{} Voted for option {} ({} votes)", "✓".green(), option, votes)
    })
}

fn cmd_comment(ctx: &Ctx, args: CommentArgs) -> anyhow::Result<()> {
    let post = ctx.resolve_post(&args.post)?;
    let parent = args
        .parent
        .as_deref()
        .map(|key| resolve_comment(&post, key))
        .transpose()?;
    let comment = ctx.graph.add_comment(
        &post.id(),
        &post.author_id(),
        &args.content,
        parent.as_ref(),
    )?;
    ctx.emit(&comment, |c| {
        let what = if parent.is_some() { "Replied" } else { "Commented" };
        println!("{} {what} {}", "✓".green().bold(), c.id().handle().yellow())
    })
}

fn cmd_comment_react(ctx: &Ctx, args: CommentRef, reaction: Reaction) -> anyhow::Result<()> {
    let post = ctx.resolve_post(&args.post)?;
    let comment = resolve_comment(&post, &args.comment)?;
    let outcome = match reaction {
        Reaction::Like => ctx
            .graph
            .toggle_comment_like(&post.id(), &post.author_id(), &comment)?,
        Reaction::Dislike => ctx
            .graph
            .toggle_comment_dislike(&post.id(), &post.author_id(), &comment)?,
    };
    ctx.emit(&json!({ "comment": comment, "reaction": outcome }), |_| {
        print_reaction(outcome, reaction)
    })
}

// ---- Follows ----

#[derive(Serialize)]
struct Connections {
    followers: Vec<User>,
    following: Vec<User>,
}

fn cmd_follow(ctx: &Ctx, args: UserRef) -> anyhow::Result<()> {
    let target = ctx.resolve_user(&args.user)?;
    let following = ctx.graph.toggle_follow(&target.id())?;
    ctx.emit(&json!({ "user": target.id(), "following": following }), |_| {
        if following {
            println!("{} Following {}", "✓".green().bold(), target.username.bold());
        } else {
            println!("Unfollowed {}", target.username.bold());
        }
    })
}

fn cmd_connections(ctx: &Ctx, args: ConnectionsArgs) -> anyhow::Result<()> {
    let user = match args.user {
        Some(key) => ctx.resolve_user(&key)?,
        None => ctx.signed_in()?,
    };
    let connections = Connections {
        followers: ctx.graph.followers_of(&user.id())?,
        following: ctx.graph.following_of(&user.id())?,
    };
    ctx.emit(&connections, |c| {
        println!("{} ({})", "Followers".bold(), c.followers.len());
        c.followers.iter().for_each(print_user_line);
        println!("{} ({})", "Following".bold(), c.following.len());
        c.following.iter().for_each(print_user_line);
    })
}

// ---- Inbox ----

fn cmd_send(ctx: &Ctx, args: SendArgs) -> anyhow::Result<()> {
    let to = ctx.resolve_user(&args.to)?;
    let message = ctx.graph.send_message(&to.id(), &args.content)?;
    ctx.emit(&message, |_| {
        println!("{} Sent to {}", "✓".green().bold(), to.username.bold())
    })
}

fn cmd_inbox(ctx: &Ctx, args: InboxArgs) -> anyhow::Result<()> {
    let names = ctx.names()?;
    if args.all {
        let messages = ctx.graph.inbox()?;
        return ctx.emit(&messages, |messages| {
            messages.iter().for_each(|m| print_message(m, &names))
        });
    }
    let summaries = ctx.graph.conversations()?;
    ctx.emit(&summaries, |summaries| {
        if summaries.is_empty() {
            println!("No messages.");
        }
        for s in summaries {
            print_summary(s, &names);
        }
    })
}

fn cmd_conversation(ctx: &Ctx, args: UserRef) -> anyhow::Result<()> {
    let other = ctx.resolve_user(&args.user)?;
    let messages = ctx.graph.conversation(&other.id())?;
    let marked = ctx.graph.mark_conversation_read(&other.id())?;
    debug!(with = %other.id(), marked, "conversation opened");
    let names = ctx.names()?;
    ctx.emit(&messages, |messages| {
        if messages.is_empty() {
            println!("No messages with {}.", other.username.bold());
        }
        messages.iter().for_each(|m| print_message(m, &names))
    })
}

fn cmd_notifications(ctx: &Ctx, args: NotificationsArgs) -> anyhow::Result<()> {
    let mut notes = ctx.graph.notifications()?;
    if args.unread {
        notes.retain(|n| !n.read);
    }
    ctx.emit(&notes, |notes| {
        if notes.is_empty() {
            println!("No notifications.");
        }
        notes.iter().for_each(print_notification)
    })
}

fn cmd_read(ctx: &Ctx, args: ReadArgs) -> anyhow::Result<()> {
    if args.all {
        let count = ctx.graph.mark_all_notifications_read()?;
        return ctx.emit(&json!({ "marked": count }), |_| {
            println!("{} Marked {} notifications read", "✓".green(), count)
        });
    }
    let key = args
        .notification
        .as_deref()
        .map(|k| k.trim().to_lowercase())
        .ok_or_else(|| anyhow!("pass a notification id or --all"))?;
    let found: Vec<NotificationId> = ctx
        .graph
        .notifications()?
        .into_iter()
        .map(|n| n.id)
        .filter(|id| id_matches(&id.to_string(), &key))
        .collect();
    let id = pick(found, "notification", &key)?;
    ctx.graph.mark_notification_read(&id)?;
    ctx.emit(&json!({ "marked": 1 }), |_| {
        println!("{} Marked {} read", "✓".green(), id.handle().yellow())
    })
}

// ---- Rendering ----

fn print_user_line(user: &User) {
    println!(
        "  {} {} <{}>",
        user.id().handle().dimmed(),
        user.username.bold(),
        user.email()
    );
}

fn print_profile(user: &User) {
    println!("{} <{}>", user.username.bold(), user.email());
    println!("  Id: {}", user.id().to_string().cyan());
    if let Some(avatar) = &user.avatar {
        println!("  Avatar: {avatar}");
    }
    if let Some(bio) = &user.bio {
        println!("  {bio}");
    }
    if let Some(state) = &user.state {
        println!("  State: {state}");
    }
    if let Some(exam) = &user.entrance_exam {
        println!("  Preparing for: {exam}");
    }
    println!("  Profile {}% complete", user.completion_percentage());
    println!(
        "  {} posts · {} followers · {} following",
        user.posts.len(),
        user.followers.len(),
        user.following.len()
    );
    for e in &user.education {
        println!(
            "  {} {} {} {} ({}-{})",
            e.id.handle().dimmed(),
            "Education:".cyan(),
            e.institution.bold(),
            e.degree,
            e.start_year,
            e.end_year
        );
    }
    for e in &user.experience {
        println!(
            "  {} {} {} at {} ({}-{})",
            e.id.handle().dimmed(),
            "Experience:".cyan(),
            e.title.bold(),
            e.company,
            e.start_date,
            e.end_date
        );
    }
}

fn print_posts(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts yet.");
    }
    for post in posts {
        print_post(post);
        println!();
    }
}

fn print_post(post: &Post) {
    println!(
        "{} {} {}",
        post.id().handle().yellow(),
        post.author().username.bold(),
        post.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
    if !post.content.is_empty() {
        println!("  {}", post.content);
    }
    if let Some(location) = &post.location {
        println!("  {} {location}", "at".dimmed());
    }
    for image in &post.images {
        println!("  {} {}", "image:".cyan(), image.blue());
    }
    for video in &post.videos {
        println!("  {} {}", "video:".cyan(), video.blue());
    }
    if let Some(poll) = &post.poll {
        println!("  {} {}", "poll:".cyan(), poll.question);
        for option in &poll.options {
            println!("    [{}] {} ({} votes)", option.id, option.text, option.votes);
        }
    }
    println!(
        "  {} likes · {} dislikes · {} comments · {} views",
        post.reactions.like_count().to_string().green(),
        post.reactions.dislike_count().to_string().red(),
        post.comments.len(),
        post.views
    );
}

fn print_thread(thread: &CommentThread, depth: usize) {
    let comment = &thread.comment;
    println!(
        "{}{} {}: {} ({} likes, {} dislikes)",
        "  ".repeat(depth),
        comment.id().handle().yellow(),
        comment.author().username.bold(),
        comment.content,
        comment.reactions.like_count(),
        comment.reactions.dislike_count()
    );
    for reply in &thread.replies {
        print_thread(reply, depth + 1);
    }
}

fn print_reaction(outcome: Option<Reaction>, requested: Reaction) {
    match outcome {
        Some(reaction) => println!("{} {}d", "✓".green().bold(), reaction),
        None => println!("Removed your {requested}."),
    }
}

fn display_name(names: &HashMap<UserId, String>, id: &UserId) -> String {
    names.get(id).cloned().unwrap_or_else(|| id.handle())
}

fn print_message(message: &Message, names: &HashMap<UserId, String>) {
    let marker = if message.read { " " } else { "●" };
    println!(
        "{} {} {} → {}: {}",
        marker.blue(),
        message.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        display_name(names, &message.sender_id).bold(),
        display_name(names, &message.receiver_id),
        message.content
    );
}

fn print_summary(summary: &ConversationSummary, names: &HashMap<UserId, String>) {
    let unread = if summary.unread > 0 {
        format!(" ({} unread)", summary.unread).blue().to_string()
    } else {
        String::new()
    };
    println!(
        "{}{}: {}",
        display_name(names, &summary.with).bold(),
        unread,
        summary.last.content.dimmed()
    );
}

fn print_notification(note: &Notification) {
    let marker = if note.read { " " } else { "●" };
    println!(
        "{} {} {} {}",
        marker.blue(),
        note.id.handle().dimmed(),
        note.kind.to_string().cyan(),
        note.content
    );
}
