use crate::classify::similarity::normalize;
use crate::store::{ContentStore, StoreError};
use crate::types::{
    BlacklistEntry, FaqEntry, Moderator, ProductSheet, PromoEntry, SopEntry, StockRecord,
};

/// In-memory snapshot of the static content the classifiers read.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub faqs: Vec<FaqEntry>,
    pub sops: Vec<SopEntry>,
    pub products: Vec<ProductSheet>,
    pub stock: Vec<StockRecord>,
    pub moderators: Vec<Moderator>,
    pub promos: Vec<PromoEntry>,
    pub blacklist: Vec<BlacklistEntry>,
}

impl Catalog {
    pub async fn load(store: &ContentStore) -> Result<Self, StoreError> {
        let catalog = Self {
            faqs: store.list().await?,
            sops: store.list().await?,
            products: store.list().await?,
            stock: store.list().await?,
            moderators: store.list().await?,
            promos: store.list().await?,
            blacklist: store.list().await?,
        };
        tracing::debug!(
            faqs = catalog.faqs.len(),
            sops = catalog.sops.len(),
            products = catalog.products.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn is_active_moderator(&self, number: &str) -> bool {
        self.moderators.iter().any(|m| m.active && m.number == number)
    }

    pub fn is_blacklisted(&self, number: &str) -> bool {
        self.blacklist.iter().any(|b| b.number == number)
    }

    pub fn product(&self, id: uuid::Uuid) -> Option<&ProductSheet> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn faq(&self, id: uuid::Uuid) -> Option<&FaqEntry> {
        self.faqs.iter().find(|f| f.id == id)
    }

    pub fn sop(&self, id: uuid::Uuid) -> Option<&SopEntry> {
        self.sops.iter().find(|s| s.id == id)
    }

    /// Stock by product name, compared after normalization.
    pub fn stock_of(&self, product: &str) -> Option<&StockRecord> {
        let wanted = normalize(product);
        self.stock.iter().find(|s| normalize(&s.product) == wanted)
    }

    pub fn active_promos(&self) -> impl Iterator<Item = &PromoEntry> {
        self.promos.iter().filter(|p| p.active)
    }
}
