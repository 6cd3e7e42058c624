use uuid::Uuid;

use super::{Collection, Record};
use crate::types::{
    AttendanceRecord, BlacklistEntry, Buyer, ClaimLog, FaqEntry, KnowledgeEntry, LearningEvent,
    Moderator, ProductSheet, PromoEntry, SopEntry, StockRecord,
};

macro_rules! record {
    ($ty:ty, $collection:expr) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;
            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
}

record!(FaqEntry, Collection::Faq);
record!(SopEntry, Collection::Sop);
record!(ProductSheet, Collection::Product);
record!(StockRecord, Collection::Stock);
record!(Buyer, Collection::Buyer);
record!(Moderator, Collection::Moderator);
record!(ClaimLog, Collection::Claim);
record!(PromoEntry, Collection::Promo);
record!(BlacklistEntry, Collection::Blacklist);
record!(KnowledgeEntry, Collection::Knowledge);
record!(LearningEvent, Collection::LearningLog);
record!(AttendanceRecord, Collection::Attendance);
