//! Ledger operator implementation.

use std::path::Path;

use crate::application::ledger::LedgerService;
use crate::domain::id::UserId;
use crate::domain::ledger::Buckets;
use crate::error::Result;
use crate::port::inbound::operator::ledger::{BalanceView, LedgerOperator};

use super::entry::Operator;
use super::shared::open;

fn service(path: &Path) -> Result<LedgerService> {
    let (config, db) = open(path)?;
    Ok(LedgerService::new(db, config.ledger))
}

impl LedgerOperator for Operator {
    fn balance(&self, path: &Path, user: &str, limit: usize) -> Result<BalanceView> {
        let ledger = service(path)?;
        let user = UserId::from(user);
        Ok(BalanceView {
            balance: ledger.balance(&user)?,
            recent: ledger.transactions(&user, limit)?,
        })
    }

    fn audit(&self, path: &Path, user: &str) -> Result<Buckets> {
        service(path)?.replay(&UserId::from(user))
    }
}
