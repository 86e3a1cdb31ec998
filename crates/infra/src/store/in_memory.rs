use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use bazaar_auth::{NewUser, Role, User};
use bazaar_core::{ProductId, SaleId, UserId};
use bazaar_products::{NewProduct, Product};
use bazaar_sales::{NewSale, Sale, SaleDetails, SaleFilter, SaleLineItem, SaleStatus};

use super::traits::{ProductStore, SaleStore, StoreError, StoreResult, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    sales: BTreeMap<SaleId, Sale>,
    sale_items: BTreeMap<SaleId, Vec<SaleLineItem>>,
    last_user_id: i64,
    last_product_id: i64,
    last_sale_id: i64,
}

/// In-memory store for tests/dev.
///
/// All tables sit behind one lock, so every write (a sale with its line
/// items, a user delete with its cascade) is a single critical section and
/// references between tables are checked the way the database would.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users.email".to_string()));
        }

        tables.last_user_id += 1;
        let id = UserId::new(tables.last_user_id);
        let user = user.into_user(id);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.read()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn list(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let tables = self.read()?;
        Ok(tables
            .users
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: UserId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }

        let orphaned: Vec<SaleId> = tables
            .sales
            .values()
            .filter(|s| s.user_id == id || s.seller_id == id)
            .map(|s| s.id)
            .collect();
        for sale_id in orphaned {
            tables.sales.remove(&sale_id);
            tables.sale_items.remove(&sale_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert(&self, product: NewProduct) -> StoreResult<Product> {
        let mut tables = self.write()?;
        tables.last_product_id += 1;
        let id = ProductId::new(tables.last_product_id);
        let product = product.into_product(id);
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }
}

#[async_trait]
impl SaleStore for InMemoryStore {
    async fn insert(&self, sale: NewSale) -> StoreResult<SaleDetails> {
        let mut tables = self.write()?;

        for party in [sale.user_id, sale.seller_id] {
            if !tables.users.contains_key(&party) {
                return Err(StoreError::MissingReference(format!("users.id = {party}")));
            }
        }
        if let Some(missing) = sale
            .items
            .iter()
            .find(|item| !tables.products.contains_key(&item.product_id))
        {
            return Err(StoreError::MissingReference(format!(
                "products.id = {}",
                missing.product_id
            )));
        }

        tables.last_sale_id += 1;
        let id = SaleId::new(tables.last_sale_id);
        let (sale, items) = sale.into_rows(id, Utc::now());
        tables.sales.insert(id, sale.clone());
        tables.sale_items.insert(id, items.clone());

        Ok(SaleDetails {
            sale,
            products: items,
        })
    }

    async fn find_by_id(&self, id: SaleId) -> StoreResult<Option<Sale>> {
        Ok(self.read()?.sales.get(&id).cloned())
    }

    async fn line_items(&self, id: SaleId) -> StoreResult<Vec<SaleLineItem>> {
        Ok(self.read()?.sale_items.get(&id).cloned().unwrap_or_default())
    }

    async fn list(&self, filter: SaleFilter) -> StoreResult<Vec<Sale>> {
        let tables = self.read()?;
        Ok(tables
            .sales
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: SaleId,
        expected: SaleStatus,
        next: SaleStatus,
    ) -> StoreResult<bool> {
        let mut tables = self.write()?;
        match tables.sales.get_mut(&id) {
            Some(sale) if sale.status == expected => {
                sale.status = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_sales::LineItem;
    use rust_decimal::Decimal;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: format!("{role} account holder"),
            email: email.to_string(),
            password_digest: "digest".to_string(),
            role,
        }
    }

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Decimal::new(220, 2),
            url_image: format!("http://localhost:3001/images/{name}.jpg"),
        }
    }

    async fn seeded() -> (InMemoryStore, User, User, Product) {
        let store = InMemoryStore::new();
        let buyer = UserStore::insert(&store, new_user("zebirita@email.com", Role::Customer))
            .await
            .unwrap();
        let seller = UserStore::insert(&store, new_user("fulana@deliveryapp.com", Role::Seller))
            .await
            .unwrap();
        let product = ProductStore::insert(&store, new_product("skol_lata_350ml"))
            .await
            .unwrap();
        (store, buyer, seller, product)
    }

    fn new_sale(buyer: &User, seller: &User, product: &Product) -> NewSale {
        NewSale {
            user_id: buyer.id,
            seller_id: seller.id,
            total_price: Decimal::new(440, 2),
            delivery_address: "rua 16".to_string(),
            delivery_number: "5".to_string(),
            items: vec![LineItem {
                product_id: product.id,
                quantity: 2,
            }],
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let (store, ..) = seeded().await;
        let err = UserStore::insert(&store, new_user("zebirita@email.com", Role::Seller))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn list_filters_by_role() {
        let (store, _, seller, _) = seeded().await;
        let sellers = UserStore::list(&store, Some(Role::Seller)).await.unwrap();
        assert_eq!(sellers, vec![seller]);
        assert_eq!(UserStore::list(&store, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sale_is_stored_with_its_items() {
        let (store, buyer, seller, product) = seeded().await;
        let details = SaleStore::insert(&store, new_sale(&buyer, &seller, &product))
            .await
            .unwrap();

        assert_eq!(details.sale.status, SaleStatus::Pending);
        let stored = SaleStore::find_by_id(&store, details.sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, details.sale);
        assert_eq!(
            store.line_items(details.sale.id).await.unwrap(),
            details.products
        );
    }

    #[tokio::test]
    async fn sale_with_unknown_product_leaves_nothing_behind() {
        let (store, buyer, seller, product) = seeded().await;
        let mut sale = new_sale(&buyer, &seller, &product);
        sale.items.push(LineItem {
            product_id: ProductId::new(404),
            quantity: 1,
        });

        let err = SaleStore::insert(&store, sale).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference(_)));
        assert!(SaleStore::list(&store, SaleFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_update_is_compare_and_swap() {
        let (store, buyer, seller, product) = seeded().await;
        let id = SaleStore::insert(&store, new_sale(&buyer, &seller, &product))
            .await
            .unwrap()
            .sale
            .id;

        assert!(store
            .update_status(id, SaleStatus::Pending, SaleStatus::Preparing)
            .await
            .unwrap());
        // A second writer that read the old status loses.
        assert!(!store
            .update_status(id, SaleStatus::Pending, SaleStatus::Preparing)
            .await
            .unwrap());
        assert!(!store
            .update_status(SaleId::new(99), SaleStatus::Pending, SaleStatus::Preparing)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn deleting_a_party_cascades_to_their_sales() {
        let (store, buyer, seller, product) = seeded().await;
        let id = SaleStore::insert(&store, new_sale(&buyer, &seller, &product))
            .await
            .unwrap()
            .sale
            .id;

        assert!(UserStore::delete(&store, seller.id).await.unwrap());
        assert!(SaleStore::find_by_id(&store, id).await.unwrap().is_none());
        assert!(store.line_items(id).await.unwrap().is_empty());
        assert!(!UserStore::delete(&store, seller.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_sales_by_party() {
        let (store, buyer, seller, product) = seeded().await;
        SaleStore::insert(&store, new_sale(&buyer, &seller, &product))
            .await
            .unwrap();

        let mine = SaleStore::list(&store, SaleFilter::Buyer(buyer.id)).await.unwrap();
        assert_eq!(mine.len(), 1);
        let none = SaleStore::list(&store, SaleFilter::Buyer(seller.id)).await.unwrap();
        assert!(none.is_empty());
        let sold = SaleStore::list(&store, SaleFilter::Seller(seller.id)).await.unwrap();
        assert_eq!(sold.len(), 1);
    }
}
