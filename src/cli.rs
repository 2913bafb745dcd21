//! CLI interface for the CoShop client
//!
//! Provides command parsing, output formatting and the interactive loop that
//! multiplexes stdin lines with room channel events.

use crate::api::RoomService;
use crate::cart::{Cart, WishlistChange};
use crate::catalog::{CatalogSource, Page, Reaction};
use crate::client::ShopClient;
use crate::error::{ClientError, Result};
use crate::models::{ChatMessage, MessageKind, Order, Product, RoomCode};
use crate::pricing::CheckoutReview;
use crate::session::{EndOutcome, SessionUpdate};
use crate::websocket::ChannelConnector;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Saved products listed by `/wishlist` before the rest are summarized
const WISHLIST_PREVIEW: usize = 5;

pub const QUICK_REACTIONS: [&str; 5] = ["👍", "❤️", "😍", "🔥", "💯"];

const HELP: &str = "\
Room:     /login <name>  /create [name]  /join <code>  /leave  /end  /members
          /invite [emails]  /react <emoji|1-5>  (1-5: 👍 ❤️ 😍 🔥 💯)
Browse:   /products [category]  /sort <key>  /page <n>  /search <text>
          /like <id>  /dislike <id>
Cart:     /add <id> [qty]  /qty <id> <n>  /remove <id>  /cart
          /wish <id>  /wishlist  /promo <code>  /unpromo  /checkout  /order
Orders:   /orders
Other:    /help  /quit
Any other line is sent to the room chat.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(String),
    Create(Option<String>),
    Join(String),
    Leave,
    End,
    Members,
    Invite(String),
    React(String),
    Products(Option<String>),
    Sort(String),
    Page(usize),
    Search(String),
    Like(String),
    Dislike(String),
    Add(String, u32),
    Qty(String, i64),
    Remove(String),
    Cart,
    Wish(String),
    Wishlist,
    Promo(String),
    Unpromo,
    Checkout,
    Order,
    Orders,
    Help,
    Quit,
    Message(String),
}

fn required(arg: &str, usage: &str) -> std::result::Result<String, String> {
    if arg.is_empty() {
        Err(format!("Usage: {}", usage))
    } else {
        Ok(arg.to_string())
    }
}

fn optional(arg: &str) -> Option<String> {
    (!arg.is_empty()).then(|| arg.to_string())
}

impl Command {
    /// Parse a command string
    pub fn parse(input: &str) -> std::result::Result<Self, String> {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Message(input.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "login" => Command::Login(required(arg, "/login <name>")?),
            "create" => Command::Create(optional(arg)),
            "join" => Command::Join(required(arg, "/join <code>")?),
            "leave" => Command::Leave,
            "end" => Command::End,
            "members" | "list" => Command::Members,
            "invite" => Command::Invite(arg.to_string()),
            "react" => Command::React(required(arg, "/react <emoji>")?),
            "products" => Command::Products(optional(arg)),
            "sort" => Command::Sort(required(arg, "/sort <relevance|price-low|price-high|rating|popularity>")?),
            "page" => {
                let page = arg
                    .parse::<usize>()
                    .map_err(|_| "Usage: /page <n>".to_string())?;
                Command::Page(page)
            }
            "search" => Command::Search(arg.to_string()),
            "like" => Command::Like(required(arg, "/like <id>")?),
            "dislike" => Command::Dislike(required(arg, "/dislike <id>")?),
            "add" => {
                let mut parts = arg.split_whitespace();
                let id = required(parts.next().unwrap_or(""), "/add <id> [qty]")?;
                let quantity = match parts.next() {
                    Some(qty) => qty
                        .parse::<u32>()
                        .map_err(|_| "Usage: /add <id> [qty]".to_string())?,
                    None => 1,
                };
                Command::Add(id, quantity)
            }
            "qty" => {
                let mut parts = arg.split_whitespace();
                match (parts.next(), parts.next().map(str::parse::<i64>)) {
                    (Some(id), Some(Ok(quantity))) => Command::Qty(id.to_string(), quantity),
                    _ => return Err("Usage: /qty <id> <n>".to_string()),
                }
            }
            "remove" => Command::Remove(required(arg, "/remove <id>")?),
            "cart" => Command::Cart,
            "wish" => Command::Wish(required(arg, "/wish <id>")?),
            "wishlist" => Command::Wishlist,
            "promo" => Command::Promo(required(arg, "/promo <code>")?),
            "unpromo" => Command::Unpromo,
            "checkout" => Command::Checkout,
            "order" => Command::Order,
            "orders" => Command::Orders,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(format!("Unknown command: {}", input)),
        };
        Ok(command)
    }
}

/// Parse a command from user input
pub fn parse_command(input: &str) -> Result<Command> {
    Command::parse(input).map_err(ClientError::InvalidCommand)
}

/// Format a chat message for display
pub fn format_message(room: &RoomCode, message: &ChatMessage) -> String {
    match message.kind {
        MessageKind::Text => format!(
            "#{} [{}] <{}> {}",
            room,
            message.display_time(),
            message.sender,
            message.text
        ),
        MessageKind::Reaction => format!(
            "#{} [{}] * {} reacted {}",
            room,
            message.display_time(),
            message.sender,
            message.text
        ),
    }
}

/// Format a control message for display
pub fn format_control(room: &RoomCode, action: &str) -> String {
    format!("#{} {}", room, action)
}

pub fn format_product(product: &Product) -> String {
    let mut line = format!("[{}] {} - {}", product.id, product.name, product.price);
    if let (Some(original), Some(discount)) = (product.original_price, product.discount) {
        line.push_str(&format!(" (was {}, -{}%)", original, discount));
    }
    if !product.store.is_empty() {
        line.push_str(&format!(" | {}", product.store));
    }
    line.push_str(&format!(" | {:.1} ({} reviews)", product.rating, product.reviews));
    if !product.in_stock() {
        line.push_str(" | out of stock");
    }
    line
}

pub fn format_page(page: &Page<'_>) -> Vec<String> {
    if page.items.is_empty() {
        return vec!["No products match the current filters".to_string()];
    }
    let mut lines: Vec<String> = page.items.iter().map(|p| format_product(p)).collect();
    lines.push(format!(
        "Page {}/{} ({} products)",
        page.page, page.total_pages, page.total_items
    ));
    lines
}

pub fn format_cart(cart: &Cart, review: &CheckoutReview) -> Vec<String> {
    let breakdown = match review {
        CheckoutReview::EmptyCart => return vec!["Your cart is empty".to_string()],
        CheckoutReview::Ready(breakdown) => breakdown,
    };

    let mut lines: Vec<String> = cart
        .items()
        .iter()
        .map(|item| {
            format!(
                "[{}] {} x{} = {}",
                item.product.id,
                item.product.name,
                item.quantity,
                item.line_total()
            )
        })
        .collect();
    lines.push(format!("Subtotal ({} items): {}", cart.total_quantity(), breakdown.subtotal));
    lines.push(format!("Tax: {}", breakdown.tax));
    if breakdown.free_shipping() {
        lines.push("Shipping: FREE".to_string());
    } else {
        lines.push(format!("Shipping: {}", breakdown.shipping));
    }
    if let Some(promo) = &breakdown.promo {
        lines.push(format!("Promo {} ({}% off): -{}", promo.code, promo.percent, breakdown.discount));
    }
    lines.push(format!("Total: {}", breakdown.total));
    if let Some(remaining) = breakdown.amount_to_free_shipping() {
        lines.push(format!("Add {} more for free shipping", remaining));
    }
    lines
}

pub fn format_order(order: &Order) -> String {
    let mut line = format!(
        "{} {} {} - {} items, {}",
        order.id,
        order.date,
        order.status,
        order.item_count(),
        order.total
    );
    if let Some(tracking) = &order.tracking_number {
        line.push_str(&format!(" | tracking {}", tracking));
    }
    if let Some(eta) = order.estimated_delivery {
        line.push_str(&format!(" | est. {}", eta));
    }
    line
}

/// `/react 1` .. `/react 5` pick a quick reaction
fn resolve_reaction(arg: &str) -> &str {
    match arg.parse::<usize>() {
        Ok(n) if (1..=QUICK_REACTIONS.len()).contains(&n) => QUICK_REACTIONS[n - 1],
        _ => arg,
    }
}

/// Result of running one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(Vec<String>),
    Quit,
}

fn print(line: impl Into<String>) -> Outcome {
    Outcome::Print(vec![line.into()])
}

/// Run one command against the client
pub async fn execute<S, C>(client: &mut ShopClient<S, C>, command: Command) -> Result<Outcome>
where
    S: RoomService,
    C: ChannelConnector,
{
    let outcome = match command {
        Command::Login(name) => {
            client.session_mut().login(&name)?;
            print(format!("Logged in as {}", name.trim()))
        }
        Command::Create(name) => {
            let name = name
                .or_else(|| client.session().username().map(str::to_string))
                .unwrap_or_default();
            let code = client.session_mut().create_room(&name).await?;
            Outcome::Print(vec![
                format_control(&code, "room created, you are the host"),
                format!("Share: {}", crate::invite::room_link(&code)),
            ])
        }
        Command::Join(code) => {
            let code = client.session_mut().join_room(&code).await?;
            print(format_control(&code, "joined"))
        }
        Command::Leave => match client.session_mut().leave_room().await {
            Some(code) => print(format_control(&code, "left")),
            None => print("Not in a room"),
        },
        Command::End => match client.session_mut().end_room().await? {
            EndOutcome::Terminated(code) => print(format_control(&code, "room ended")),
            EndOutcome::LeftWithoutTermination { room_code, reason } => print(format_control(
                &room_code,
                &format!("left, but the room could not be ended: {}", reason),
            )),
        },
        Command::Members => {
            let code = client.session().room_code().ok_or(ClientError::NotInRoom)?;
            print(format_control(
                code,
                &format!("members: {}", client.session().members().join(", ")),
            ))
        }
        Command::Invite(emails) => {
            let invitation = client.invite(&emails)?;
            let mut lines = vec![format!("Room link: {}", invitation.link)];
            if invitation.recipients.is_empty() {
                lines.push(invitation.share_text());
            } else {
                lines.push(format!("Invitation sent to {}", invitation.recipients.join(", ")));
            }
            Outcome::Print(lines)
        }
        Command::React(emoji) => {
            client.session_mut().send_reaction(resolve_reaction(&emoji)).await?;
            Outcome::Print(Vec::new())
        }
        Command::Products(category) => {
            if category.is_some() {
                client.set_category(category.as_deref())?;
            }
            let mut lines = Vec::new();
            if let CatalogSource::Fallback { .. } = client.catalog().source() {
                lines.push("(showing sample products)".to_string());
            }
            lines.push(format!("Categories: {}", client.catalog().categories().join(", ")));
            lines.extend(format_page(&client.listing()));
            Outcome::Print(lines)
        }
        Command::Sort(key) => {
            client.set_sort(&key)?;
            Outcome::Print(format_page(&client.listing()))
        }
        Command::Page(page) => {
            client.set_page(page);
            Outcome::Print(format_page(&client.listing()))
        }
        Command::Search(text) => {
            let mut lines = Vec::new();
            let suggestions = client.suggest(&text);
            if !suggestions.categories.is_empty() {
                lines.push(format!("Categories: {}", suggestions.categories.join(", ")));
            }
            if !suggestions.stores.is_empty() {
                lines.push(format!("Stores: {}", suggestions.stores.join(", ")));
            }
            client.search(&text);
            lines.extend(format_page(&client.listing()));
            Outcome::Print(lines)
        }
        Command::Like(id) => {
            let count = client.react(&id, Reaction::Like).await?;
            print(format!("Liked [{}] ({})", id, count))
        }
        Command::Dislike(id) => {
            let count = client.react(&id, Reaction::Dislike).await?;
            print(format!("Disliked [{}] ({})", id, count))
        }
        Command::Add(id, quantity) => {
            let item = client.add_to_cart(&id, quantity)?;
            print(format!("{} x{} in cart", item.product.name, item.quantity))
        }
        Command::Qty(id, quantity) => {
            client.update_quantity(&id, quantity)?;
            Outcome::Print(format_cart(client.active_cart(), &client.review()))
        }
        Command::Remove(id) => {
            client.remove_from_cart(&id)?;
            print(format!("Removed [{}]", id))
        }
        Command::Cart | Command::Checkout => {
            Outcome::Print(format_cart(client.active_cart(), &client.review()))
        }
        Command::Wish(id) => match client.toggle_wishlist(&id)? {
            WishlistChange::Added => print(format!("Saved [{}] to wishlist", id)),
            WishlistChange::Removed => print(format!("Removed [{}] from wishlist", id)),
        },
        Command::Wishlist => {
            let wishlist = client.wishlist();
            let total = wishlist.items().len();
            if total == 0 {
                return Ok(print("Your wishlist is empty"));
            }
            let shown = wishlist.preview(WISHLIST_PREVIEW);
            let mut lines = vec![format!("Wishlist ({})", total)];
            lines.extend(shown.iter().map(format_product));
            if total > shown.len() {
                lines.push(format!("...and {} more", total - shown.len()));
            }
            Outcome::Print(lines)
        }
        Command::Promo(code) => {
            let promo = client.apply_promo(&code)?;
            print(format!("Promo {} applied: {}% off", promo.code, promo.percent))
        }
        Command::Unpromo => match client.remove_promo() {
            Some(promo) => print(format!("Promo {} removed", promo.code)),
            None => print("No promo applied"),
        },
        Command::Order => {
            let order = client.place_order()?;
            print(format!("Order placed: {}", format_order(&order)))
        }
        Command::Orders => {
            let history = client.orders();
            let mut lines = vec![format!("Active orders ({})", history.active().len())];
            lines.extend(history.active().into_iter().map(format_order));
            lines.push(format!("Order history ({})", history.completed().len()));
            lines.extend(history.completed().into_iter().map(format_order));
            Outcome::Print(lines)
        }
        Command::Help => Outcome::Print(HELP.lines().map(str::to_string).collect()),
        Command::Quit => Outcome::Quit,
        Command::Message(text) => {
            if text.is_empty() {
                return Ok(Outcome::Print(Vec::new()));
            }
            client.session_mut().send_message(&text).await?;
            Outcome::Print(Vec::new())
        }
    };
    Ok(outcome)
}

/// Render a session update; `None` when there is nothing to show
pub fn format_update(room: Option<&RoomCode>, update: &SessionUpdate) -> Option<String> {
    match (update, room) {
        (SessionUpdate::Message(message), Some(room)) => Some(format_message(room, message)),
        (SessionUpdate::MemberJoined(name), Some(room)) => {
            Some(format_control(room, &format!("{} joined", name)))
        }
        (SessionUpdate::MemberLeft(name), Some(room)) => {
            Some(format_control(room, &format!("{} left", name)))
        }
        (SessionUpdate::RoomEnded(code), _) => Some(format_control(code, "the host ended the room")),
        _ => None,
    }
}

/// Async stdin reader that yields one line at a time
///
/// # Returns
/// - `Ok(Some(line))` - User entered a line
/// - `Ok(None)` - EOF reached (Ctrl+D)
/// - `Err(e)` - I/O error
pub async fn read_line_async(reader: &mut BufReader<tokio::io::Stdin>) -> Result<Option<String>> {
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) => Ok(None), // EOF
        Ok(_) => {
            // Remove trailing newline
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Some(line))
        }
        Err(e) => Err(e.into()),
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Forward stdin lines into a channel so they can be awaited alongside
/// room events
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut reader = BufReader::new(tokio::io::stdin());
        loop {
            match read_line_async(&mut reader).await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Run the interactive client loop until `/quit` or end of input
pub async fn run_client_loop<S, C>(client: &mut ShopClient<S, C>) -> Result<()>
where
    S: RoomService,
    C: ChannelConnector,
{
    if client.catalog().is_sample_data() {
        println!("Could not load products from the server, showing sample data");
    }
    match client.session().username() {
        Some(name) => println!("Welcome back, {}", name),
        None => println!("Set a username with /login <name>"),
    }
    match client.session_mut().resume_room().await {
        Ok(Some(code)) => println!("{}", format_control(&code, "rejoined")),
        Ok(None) => {}
        Err(e) => println!("Could not rejoin your last room: {}", e),
    }
    println!("Type /help for commands");

    let mut input = spawn_stdin_reader();
    prompt();

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    break;
                };
                let outcome = match parse_command(&line) {
                    Ok(command) => execute(client, command).await,
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(Outcome::Quit) => break,
                    Ok(Outcome::Print(lines)) => {
                        for line in lines {
                            println!("{}", line);
                        }
                    }
                    Err(e) => println!("Error: {}", e),
                }
                prompt();
            }
            event = client.session_mut().next_event() => {
                match event {
                    Some(event) => {
                        let update = client.session_mut().handle_event(event).await;
                        let room = client.session().room_code().cloned();
                        if let Some(line) = format_update(room.as_ref(), &update) {
                            println!("\r{}", line);
                            prompt();
                        }
                    }
                    None => {
                        println!("\rConnection to the room was lost. Use /leave and /join to reconnect.");
                        prompt();
                    }
                }
            }
        }
    }

    if client.session().is_in_room() {
        log::info!("Closing room channel");
        client.session_mut().leave_room().await;
    }
    println!("Goodbye!");
    Ok(())
}
