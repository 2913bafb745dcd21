/// Main CoShop client orchestrator
///
/// Ties the catalog, carts, wishlist, checkout and order history to the room
/// session. While in a room, cart operations go to the room's shared cart;
/// otherwise they go to the personal cart.

use crate::api::{RoomService, ServerApi};
use crate::cart::{Cart, CartItem, Wishlist, WishlistChange};
use crate::catalog::{
    load_catalog, Catalog, InMemoryCatalog, Page, ProductQuery, Reaction, ReactionTally, SortKey,
    Suggestions,
};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::invite::Invitation;
use crate::models::{Order, Product, ProductId};
use crate::orders::OrderHistory;
use crate::pricing::{Checkout, CheckoutReview, PromoCode};
use crate::session::RoomSession;
use crate::storage::LocalStore;
use crate::websocket::{ChannelConnector, WebSocketConnector};

pub struct ShopClient<S: RoomService, C: ChannelConnector> {
    catalog: Catalog,
    query: ProductQuery,
    cart: Cart,
    wishlist: Wishlist,
    checkout: Checkout,
    orders: OrderHistory,
    reactions: ReactionTally,
    session: RoomSession<S, C>,
}

impl ShopClient<ServerApi, WebSocketConnector> {
    /// Build a client against the configured room service.
    ///
    /// # Errors
    /// * File system errors when creating the state directory
    /// * Database initialization errors
    /// * Invalid server or socket URLs
    pub async fn from_config(config: &Config) -> Result<Self> {
        let state_dir = config.state_dir()?;
        std::fs::create_dir_all(&state_dir)?;
        let store = LocalStore::new(config.database_path()?)?;

        let api = ServerApi::new(&config.server, config.timeout())?;
        let connector = WebSocketConnector::new(&config.socket_url()?);

        let load = load_catalog(&api, &InMemoryCatalog::sample()).await?;
        let session = RoomSession::new(api, connector, store)?;
        Ok(Self::new(Catalog::new(load), session))
    }
}

impl<S: RoomService, C: ChannelConnector> ShopClient<S, C> {
    pub fn new(catalog: Catalog, session: RoomSession<S, C>) -> Self {
        Self {
            catalog,
            query: ProductQuery::default(),
            cart: Cart::new(),
            wishlist: Wishlist::new(),
            checkout: Checkout::new(),
            orders: OrderHistory::default(),
            reactions: ReactionTally::new(),
            session,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session(&self) -> &RoomSession<S, C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut RoomSession<S, C> {
        &mut self.session
    }

    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub fn orders(&self) -> &OrderHistory {
        &self.orders
    }

    pub fn reactions(&self) -> &ReactionTally {
        &self.reactions
    }

    /// The room's shared cart while in a room, the personal cart otherwise
    pub fn active_cart(&self) -> &Cart {
        if self.session.is_in_room() {
            self.session.shared_cart()
        } else {
            &self.cart
        }
    }

    fn active_cart_mut(&mut self) -> &mut Cart {
        if self.session.is_in_room() {
            self.session.shared_cart_mut()
        } else {
            &mut self.cart
        }
    }

    fn product(&self, id: &str) -> Result<Product> {
        self.catalog.find(&ProductId::from(id)).cloned()
    }

    // Browsing

    pub fn query(&self) -> &ProductQuery {
        &self.query
    }

    pub fn listing(&self) -> Page<'_> {
        self.catalog.browse(&self.query)
    }

    /// Filter by category; `all` (or none) clears the filter. Resets to page 1.
    pub fn set_category(&mut self, category: Option<&str>) -> Result<()> {
        let category = category.map(str::trim).filter(|c| !c.is_empty() && *c != "all");
        if let Some(category) = category {
            if !self.catalog.categories().contains(&category) {
                return Err(ClientError::ValidationError(format!(
                    "Unknown category: {}",
                    category
                )));
            }
        }
        self.query.category = category.map(str::to_string);
        self.query.page = 1;
        Ok(())
    }

    pub fn set_sort(&mut self, key: &str) -> Result<SortKey> {
        let sort = SortKey::parse(key)?;
        self.query.sort = sort;
        Ok(sort)
    }

    pub fn set_page(&mut self, page: usize) {
        self.query.page = page.max(1);
    }

    /// Free-text filter; blank text clears it
    pub fn search(&mut self, text: &str) {
        let text = text.trim();
        self.query.text = (!text.is_empty()).then(|| text.to_string());
        self.query.page = 1;
    }

    pub fn suggest(&self, text: &str) -> Suggestions<'_> {
        self.catalog.suggest(text)
    }

    /// Like or dislike a product. In a room the reaction is also posted to
    /// the chat.
    pub async fn react(&mut self, id: &str, reaction: Reaction) -> Result<u32> {
        let product = self.product(id)?;
        let count = self.reactions.react(&product.id, reaction);
        if self.session.is_in_room() {
            let emoji = match reaction {
                Reaction::Like => "👍",
                Reaction::Dislike => "👎",
            };
            self.session
                .send_reaction(&format!("{} {}", emoji, product.name))
                .await?;
        }
        Ok(count)
    }

    // Cart and wishlist

    pub fn add_to_cart(&mut self, id: &str, quantity: u32) -> Result<&CartItem> {
        let product = self.product(id)?;
        let cart = self.active_cart_mut();
        cart.add(&product, quantity);
        cart.find(&product.id)
            .ok_or_else(|| ClientError::ValidationError("Quantity must be at least 1".to_string()))
    }

    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> Result<()> {
        let product_id = ProductId::from(id);
        let cart = self.active_cart_mut();
        if cart.find(&product_id).is_none() {
            return Err(ClientError::ProductNotFound(product_id.to_string()));
        }
        cart.update_quantity(&product_id, quantity);
        Ok(())
    }

    pub fn remove_from_cart(&mut self, id: &str) -> Result<()> {
        let product_id = ProductId::from(id);
        if self.active_cart_mut().remove(&product_id) {
            Ok(())
        } else {
            Err(ClientError::ProductNotFound(product_id.to_string()))
        }
    }

    pub fn toggle_wishlist(&mut self, id: &str) -> Result<WishlistChange> {
        let product = self.product(id)?;
        Ok(self.wishlist.toggle(&product))
    }

    // Checkout

    pub fn promo(&self) -> Option<&PromoCode> {
        self.checkout.promo()
    }

    pub fn apply_promo(&mut self, code: &str) -> Result<PromoCode> {
        self.checkout.apply_promo(code).cloned()
    }

    pub fn remove_promo(&mut self) -> Option<PromoCode> {
        self.checkout.remove_promo()
    }

    pub fn review(&self) -> CheckoutReview {
        self.checkout.review(self.active_cart())
    }

    pub fn place_order(&mut self) -> Result<Order> {
        let cart = if self.session.is_in_room() {
            self.session.shared_cart_mut()
        } else {
            &mut self.cart
        };
        self.orders.place_order(cart, &mut self.checkout).cloned()
    }

    // Room

    pub fn invite(&self, emails: &str) -> Result<Invitation> {
        let room_code = self.session.room_code().ok_or(ClientError::NotInRoom)?;
        Invitation::new(room_code, emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogLoad, CatalogSource};
    use crate::models::RoomCode;
    use crate::sample;
    use crate::websocket::RealtimeChannel;

    struct NoService;

    impl RoomService for NoService {
        async fn create_room(&self, _username: &str) -> Result<RoomCode> {
            Err(ClientError::ServerError("offline".to_string()))
        }

        async fn lookup_room(&self, room_code: &RoomCode) -> Result<RoomCode> {
            Err(ClientError::InvalidRoom(room_code.to_string()))
        }

        async fn end_room(&self, _room_code: &RoomCode) -> Result<()> {
            Err(ClientError::ServerError("offline".to_string()))
        }
    }

    struct NoChannel;

    impl RealtimeChannel for NoChannel {
        async fn emit(&self, _event: &crate::models::OutboundEvent) -> Result<()> {
            Ok(())
        }

        async fn next_event(&mut self) -> Option<crate::models::InboundEvent> {
            None
        }

        async fn close(&mut self) {}
    }

    impl ChannelConnector for NoService {
        type Channel = NoChannel;

        async fn connect(&self) -> Result<NoChannel> {
            Err(ClientError::WebSocketError("offline".to_string()))
        }
    }

    fn offline_client() -> ShopClient<NoService, NoService> {
        let catalog = Catalog::new(CatalogLoad {
            products: sample::products(),
            source: CatalogSource::Remote,
        });
        let session = RoomSession::new(NoService, NoService, LocalStore::in_memory().unwrap()).unwrap();
        ShopClient::new(catalog, session)
    }

    #[test]
    fn test_personal_cart_when_not_in_room() {
        let mut client = offline_client();
        client.add_to_cart("2", 2).unwrap();
        client.add_to_cart("2", 1).unwrap();
        assert_eq!(client.active_cart().quantity_of(&ProductId::from("2")), 3);

        client.update_quantity("2", 0).unwrap();
        assert!(client.active_cart().is_empty());
    }

    #[test]
    fn test_unknown_product() {
        let mut client = offline_client();
        assert!(matches!(
            client.add_to_cart("42", 1),
            Err(ClientError::ProductNotFound(_))
        ));
        assert!(client.remove_from_cart("1").is_err());
    }

    #[test]
    fn test_set_category_validates() {
        let mut client = offline_client();
        client.set_page(3);
        client.set_category(Some("Fitness")).unwrap();
        assert_eq!(client.listing().total_items, 1);
        assert_eq!(client.query().page, 1);

        assert!(client.set_category(Some("Garden")).is_err());
        client.set_category(Some("all")).unwrap();
        assert_eq!(client.listing().total_items, 8);
    }

    #[test]
    fn test_checkout_flow() {
        let mut client = offline_client();
        assert_eq!(client.review(), CheckoutReview::EmptyCart);

        client.add_to_cart("1", 1).unwrap();
        client.apply_promo("welcome20").unwrap();
        let order = client.place_order().unwrap();

        // 299.99 + 24.00 tax - 60.00 discount
        assert_eq!(order.total, crate::models::Money::from_cents(26_399));
        assert!(client.active_cart().is_empty());
        assert!(client.promo().is_none());
    }

    #[tokio::test]
    async fn test_offline_reaction_is_counted() {
        let mut client = offline_client();
        assert_eq!(client.react("6", Reaction::Like).await.unwrap(), 1);
        assert_eq!(
            client.reactions().count(&ProductId::from("6"), Reaction::Like),
            1
        );
    }

    #[test]
    fn test_invite_requires_room() {
        let client = offline_client();
        assert!(matches!(client.invite(""), Err(ClientError::NotInRoom)));
    }
}
