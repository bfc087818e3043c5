//! Per-kind intent assembly
//!
//! Everything here runs before the first write: parse the amount, read the
//! chain state the intent depends on, and lay out the steps. Any failure is
//! returned as an `IntentError` and nothing is submitted.

use candid::Nat;
use tracing::{debug, warn};
use crate::infrastructure::{ActionTarget, Result, IntentError, ValidationError};
use crate::types::{Address, CallFunction, ContractCall, IntentKind, SwapDirection, Token, TokenAmount};
use crate::_1_INTENT_OPERATIONS::intent::{Step, StepRole, TransactionIntent};
use crate::_2_CHAIN_STATE::read_with_retries;
use crate::_2_CHAIN_STATE::refresh::InvalidationTarget;
use crate::_4_TRADING_EXECUTION::approvals::{build_approval_step, AllowanceGuard};
use crate::_4_TRADING_EXECUTION::slippage::SlippageTolerance;
use crate::_4_TRADING_EXECUTION::swaps::build_swap_call;
use super::OrchestratorInner;

/// Parse user input and reject zero
fn parse_amount(kind: IntentKind, token: &Token, input: &str) -> Result<TokenAmount> {
    let amount = TokenAmount::parse(token, input)?;
    if amount.is_zero() {
        return Err(IntentError::Validation(ValidationError::ZeroAmount { kind: kind.to_string() }));
    }
    Ok(amount)
}

async fn read_balance(inner: &OrchestratorInner, token: &Token) -> Result<Nat> {
    let ledger = inner.ledger.as_ref();
    let holder = &inner.user;
    let token_address = &token.address;
    read_with_retries("balance", inner.retries(), move || ledger.read_balance(holder, token_address)).await
}

/// Optional approval of exactly `amount` for `spender`
async fn approval_for(inner: &OrchestratorInner, spender: &Address, amount: &TokenAmount) -> Result<Option<Step>> {
    let guard = AllowanceGuard::new(inner.ledger.as_ref(), inner.retries());
    if guard.needs_approval(&inner.user, spender, amount).await? {
        Ok(Some(build_approval_step(spender, amount)))
    } else {
        Ok(None)
    }
}

/// Deposit and stake: optional approval, then the contract call
pub(super) async fn build_funding_intent(
    inner: &OrchestratorInner,
    id: String,
    kind: IntentKind,
    target: &ActionTarget,
    input: &str,
) -> Result<TransactionIntent> {
    let token = inner.config.token(&target.token)?;
    let amount = parse_amount(kind, token, input)?;

    let (balance, approval) = futures::try_join!(
        read_balance(inner, token),
        approval_for(inner, &target.contract, &amount)
    )?;
    amount.ensure_covered_by(&balance)?;

    let function = match kind {
        IntentKind::Deposit => CallFunction::Deposit { amount: amount.magnitude.clone() },
        IntentKind::Stake => CallFunction::Stake { amount: amount.magnitude.clone() },
        other => {
            return Err(IntentError::Other(format!("{} is not a funding intent", other)));
        }
    };
    let primary = Step::new(StepRole::Primary, ContractCall { to: target.contract.clone(), function });

    debug!("🧾 {} {} into {} (approval: {})", kind, amount, target.contract.short(), approval.is_some());

    let targets = vec![
        InvalidationTarget::Balance { token: token.address.clone() },
        InvalidationTarget::Allowance { token: token.address.clone(), spender: target.contract.clone() },
    ];

    let mut intent = TransactionIntent::new(id, kind, approval, primary, targets);
    intent.amount = Some(amount);
    Ok(intent)
}

/// Claim: one call, the amount is decided on-chain
pub(super) fn build_claim_intent(inner: &OrchestratorInner, id: String) -> Result<TransactionIntent> {
    let claim = &inner.config.claim;
    let reward = inner.config.token(&claim.reward_token)?;

    let primary = Step::new(
        StepRole::Primary,
        ContractCall { to: claim.contract.clone(), function: CallFunction::ClaimRewards },
    );
    let targets = vec![InvalidationTarget::Balance { token: reward.address.clone() }];

    Ok(TransactionIntent::new(id, IntentKind::Claim, None, primary, targets))
}

/// Swap: fresh quote, minimum out, deadline, optional router approval
pub(super) async fn build_swap_intent(
    inner: &OrchestratorInner,
    id: String,
    input: &str,
    direction: SwapDirection,
    tolerance: Option<SlippageTolerance>,
) -> Result<TransactionIntent> {
    let config = &inner.config;
    let path = config.swap_path(direction)?;
    let amount = parse_amount(IntentKind::Swap, path.input(), input)?;
    let tolerance = match tolerance {
        Some(t) => t,
        None => config.swap.slippage()?,
    };
    let router = &config.swap.router;
    let now = inner.clock.now_secs();
    let engine = inner.quote_engine();

    let (balance, approval, quote) = futures::try_join!(
        read_balance(inner, path.input()),
        approval_for(inner, router, &amount),
        engine.quote(&path, &amount, now)
    )?;
    amount.ensure_covered_by(&balance)?;

    if quote.is_empty() {
        warn!("⚠️ No liquidity for {} along {}", amount, path.symbols().join(" -> "));
    }
    let swap = build_swap_call(router, &quote, tolerance, &inner.user, now, config.execution_deadline_secs)?;
    let primary = Step::new(StepRole::Primary, swap.call);

    let targets = vec![
        InvalidationTarget::Balance { token: path.input().address.clone() },
        InvalidationTarget::Balance { token: path.output().address.clone() },
        InvalidationTarget::Allowance { token: path.input().address.clone(), spender: router.clone() },
    ];

    let mut intent = TransactionIntent::new(id, IntentKind::Swap, approval, primary, targets);
    intent.amount = Some(amount);
    intent.quote = Some(quote);
    intent.min_out = Some(swap.min_out);
    intent.tolerance = Some(tolerance);
    Ok(intent)
}
