pub mod biddingdb;
pub mod cashoutdb;
pub mod db;
pub mod jobdb;
pub mod ledgerdb;
pub mod memorydb;

use self::{biddingdb::BiddingExt, cashoutdb::CashoutExt, jobdb::JobExt, ledgerdb::LedgerExt};

/// Everything a workflow needs from persistence. Implemented by the Postgres
/// client and by the in-memory store; services only ever see this trait.
pub trait MarketStore: JobExt + BiddingExt + LedgerExt + CashoutExt + Send + Sync + std::fmt::Debug {
    fn backend(&self) -> &'static str;
}
