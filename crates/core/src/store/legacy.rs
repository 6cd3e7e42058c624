//! One-way import of the flat-file layout (`faq.json`, `produk/<name>.txt`, ...)
//! into empty collections. Legacy files are read, never modified.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ContentStore, Record, StoreError};
use crate::types::{
    BlacklistEntry, Buyer, ClaimLog, FaqEntry, KnowledgeEntry, Moderator, ProductSheet, PromoEntry,
    SopEntry, StockRecord,
};

/// Records imported per legacy source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<(&'static str, usize)>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.imported.iter().map(|(_, n)| n).sum()
    }
}

impl ContentStore {
    /// Seed every empty collection from the legacy files under the data dir.
    pub async fn import_legacy(&self) -> Result<ImportReport, StoreError> {
        let dir = self.data_dir().to_path_buf();
        let mut report = ImportReport::default();

        let mut push = |name: &'static str, n: usize| {
            if n > 0 {
                report.imported.push((name, n));
            }
        };

        push("faq.json", import_json::<FaqEntry>(self, &dir.join("faq.json"), None).await?);
        push("sop.json", import_json::<SopEntry>(self, &dir.join("sop.json"), None).await?);
        push("stock.json", import_json::<StockRecord>(self, &dir.join("stock.json"), None).await?);
        push("buyers.json", import_json::<Buyer>(self, &dir.join("buyers.json"), Some("number")).await?);
        push(
            "moderators.json",
            import_json::<Moderator>(self, &dir.join("moderators.json"), Some("number")).await?,
        );
        push("log_claim.json", import_json::<ClaimLog>(self, &dir.join("log_claim.json"), None).await?);
        push("promo.json", import_json::<PromoEntry>(self, &dir.join("promo.json"), Some("title")).await?);
        push(
            "blacklist.json",
            import_json::<BlacklistEntry>(self, &dir.join("blacklist.json"), Some("number")).await?,
        );
        push(
            "learning/knowledge.json",
            import_json::<KnowledgeEntry>(self, &dir.join("learning").join("knowledge.json"), None).await?,
        );
        push("produk/", import_products(self, &dir.join("produk")).await?);

        if report.total() > 0 {
            tracing::info!(total = report.total(), sources = ?report.imported, "legacy data imported");
        }
        Ok(report)
    }
}

/// Import one JSON array file. Elements lacking a UUID `id` get a fresh one;
/// bare strings are wrapped as `{scalar_field: value}` when a field is given.
async fn import_json<T: Record>(
    store: &ContentStore,
    path: &Path,
    scalar_field: Option<&str>,
) -> Result<usize, StoreError> {
    if store.count(T::COLLECTION).await? > 0 {
        return Ok(0);
    }
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let items = match serde_json::from_str::<Value>(&raw)? {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut imported = 0;
    for item in items {
        let Some(object) = with_stable_id(item, scalar_field) else {
            continue;
        };
        match serde_json::from_value::<T>(Value::Object(object)) {
            Ok(record) => {
                store.upsert(&record).await?;
                imported += 1;
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping legacy record");
            }
        }
    }
    Ok(imported)
}

fn with_stable_id(item: Value, scalar_field: Option<&str>) -> Option<Map<String, Value>> {
    let mut object = match (item, scalar_field) {
        (Value::Object(map), _) => map,
        (Value::String(s), Some(field)) => {
            let mut map = Map::new();
            map.insert(field.to_owned(), Value::String(s));
            map
        }
        _ => return None,
    };
    let has_uuid = object
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|s| Uuid::parse_str(s).is_ok());
    if !has_uuid {
        object.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    Some(object)
}

async fn import_products(store: &ContentStore, dir: &Path) -> Result<usize, StoreError> {
    if store.count(ProductSheet::COLLECTION).await? > 0 {
        return Ok(0);
    }
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut imported = 0;
    for path in paths {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let body = tokio::fs::read_to_string(&path).await?;
        let sheet = ProductSheet {
            id: Uuid::new_v4(),
            name: name.to_lowercase(),
            body: body.trim().to_owned(),
            aliases: vec![],
        };
        store.upsert(&sheet).await?;
        imported += 1;
    }
    Ok(imported)
}
