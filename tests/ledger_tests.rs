mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use adzengine::domain::ledger::{BalanceKind, EscrowStatus, WithdrawalStatus};
use adzengine::error::{Error, LedgerError};
use common::harness::{advertiser, owner, Harness};

#[test]
fn earning_splits_platform_fee() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let escrow = h.fund(&campaign, dec!(500), &["ch1"]);

    let earning = h
        .engine
        .ledger
        .record_earning(&escrow, &owner("ch1"), dec!(100.00))
        .unwrap();
    assert_eq!(earning.amount, dec!(100.00));
    assert_eq!(earning.creator_share, dec!(85.00));
    assert_eq!(earning.escrow.remaining_amount, dec!(400));

    let adv = h.engine.ledger.balance(&advertiser()).unwrap();
    assert_eq!(adv.buckets.escrow, dec!(400));
    let creator = h.engine.ledger.balance(&owner("ch1")).unwrap();
    assert_eq!(creator.kind, BalanceKind::Creator);
    assert_eq!(creator.buckets.escrow, dec!(85.00));
    assert_eq!(creator.buckets.available, Decimal::ZERO);
}

#[test]
fn exhausted_escrow_is_released() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let escrow = h.fund(&campaign, dec!(40.00), &["ch1"]);

    let earning = h
        .engine
        .ledger
        .record_earning(&escrow, &owner("ch1"), dec!(40.00))
        .unwrap();
    assert_eq!(earning.escrow.status, EscrowStatus::Released);
    assert_eq!(earning.escrow.remaining_amount, Decimal::ZERO);

    let err = h
        .engine
        .ledger
        .record_earning(&escrow, &owner("ch1"), dec!(1))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Ledger(LedgerError::InvalidStateTransition { .. })
    ));
}

#[test]
fn replay_reproduces_balances_after_full_lifecycle() {
    let h = Harness::in_memory();
    let ledger = &h.engine.ledger;
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let escrow = h.fund(&campaign, dec!(300), &["ch1"]);
    ledger.deposit(&advertiser(), dec!(700)).unwrap();

    ledger.record_earning(&escrow, &owner("ch1"), dec!(120)).unwrap();
    ledger.record_earning(&escrow, &owner("ch1"), dec!(30)).unwrap();
    ledger.release_earnings(&owner("ch1")).unwrap();

    let paid = ledger.request_withdrawal(&owner("ch1"), dec!(50)).unwrap();
    ledger.approve_withdrawal(&paid.id, "ops").unwrap();
    let completed = ledger.complete_withdrawal(&paid.id, "ops").unwrap();
    assert_eq!(completed.status, WithdrawalStatus::Completed);

    let refused = ledger.request_withdrawal(&owner("ch1"), dec!(20)).unwrap();
    let rejected = ledger.reject_withdrawal(&refused.id, "ops").unwrap();
    assert_eq!(rejected.status, WithdrawalStatus::Rejected);

    let cancelled = ledger.cancel_escrow(&escrow).unwrap();
    assert_eq!(cancelled.status, EscrowStatus::Cancelled);

    for user in [advertiser(), owner("ch1")] {
        let live = ledger.balance(&user).unwrap();
        let replayed = ledger.replay(&user).unwrap();
        assert_eq!(replayed, live.buckets, "replay for {user}");
    }

    // 1000 deposited, 150 spent at the campaign; 300 - 150 refunded.
    let adv = ledger.balance(&advertiser()).unwrap();
    assert_eq!(adv.buckets.available, dec!(850));
    assert_eq!(adv.buckets.escrow, Decimal::ZERO);

    // 85% of 150 earned, 50 paid out.
    let creator = ledger.balance(&owner("ch1")).unwrap();
    assert_eq!(creator.buckets.available, dec!(77.50));
    assert_eq!(creator.buckets.pending_withdrawals, Decimal::ZERO);
}

#[test]
fn rejected_escrow_leaves_no_partial_effect() {
    let h = Harness::in_memory();
    let ledger = &h.engine.ledger;
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    ledger.open_account(&advertiser(), BalanceKind::Advertiser).unwrap();
    ledger.deposit(&advertiser(), dec!(100)).unwrap();
    let before = ledger.transactions(&advertiser(), 100).unwrap();

    let err = ledger
        .create_campaign_escrow(&advertiser(), dec!(150), &campaign)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Ledger(LedgerError::InsufficientFunds { .. })
    ));

    let after = ledger.transactions(&advertiser(), 100).unwrap();
    assert_eq!(before.len(), after.len());
    assert_eq!(ledger.balance(&advertiser()).unwrap().buckets.available, dec!(100));
    ledger.replay(&advertiser()).unwrap();
}

#[test]
fn earning_requires_assigned_creator() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let escrow = h.fund(&campaign, dec!(200), &["ch1"]);

    let err = h
        .engine
        .ledger
        .record_earning(&escrow, &owner("stranger"), dec!(10))
        .unwrap_err();
    assert!(matches!(err, Error::Ledger(LedgerError::NotAssigned { .. })));
    assert_eq!(h.engine.ledger.escrow(&escrow).unwrap().remaining_amount, dec!(200));
}

#[test]
fn escrow_remaining_never_increases_or_goes_negative() {
    let h = Harness::in_memory();
    let campaign = h.campaign_with_budget("c1", dec!(1000));
    let escrow = h.fund(&campaign, dec!(100), &["ch1"]);

    let mut last = dec!(100);
    for amount in [dec!(30), dec!(45), dec!(40), dec!(25), dec!(5)] {
        let _ = h.engine.ledger.record_earning(&escrow, &owner("ch1"), amount);
        let remaining = h.engine.ledger.escrow(&escrow).unwrap().remaining_amount;
        assert!(remaining <= last);
        assert!(remaining >= Decimal::ZERO);
        last = remaining;
    }
    // 30 + 45 + 25 drawn; 40 did not fit and 5 found the escrow released.
    assert_eq!(last, Decimal::ZERO);
}
