use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use walletflow_core::{
    chain::{ChainRead, TxReceipt},
    constants::{ALLOWANCE_SELECTOR, APPROVAL_EVENT_SIGNATURE, APPROVE_SELECTOR},
    error::OrchestratorError,
    transaction::{ConfirmationResult, ContractCall},
};

use crate::confirm::ConfirmationWaiter;
use crate::session::WalletSession;
use crate::submit::{SubmitOutcome, Submitter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowanceOutcome {
    /// Current allowance already covers the required amount; nothing was
    /// submitted.
    AlreadySufficient,
    /// One approval transaction was submitted and fully confirmed.
    Approved { receipt: TxReceipt },
    /// The user declined the approval prompt.
    Canceled,
}

/// Precondition for value-moving calls: make sure the signer's allowance to
/// `spender` covers `required`, submitting and fully confirming an
/// approve-max transaction first when it does not. The primary transaction
/// must not be sent until the approval is mined, since target contracts
/// revert on insufficient allowance rather than queue.
pub async fn ensure_allowance<C: ChainRead>(
    submitter: &Submitter<C>,
    waiter: &ConfirmationWaiter<C>,
    session: &WalletSession,
    token: Address,
    spender: Address,
    required: U256,
) -> Result<AllowanceOutcome, OrchestratorError> {
    let current = read_allowance(submitter.chain().as_ref(), token, session.address, spender).await?;

    if current >= required {
        tracing::debug!(%token, %spender, %current, %required, "allowance sufficient");
        return Ok(AllowanceOutcome::AlreadySufficient);
    }

    tracing::info!(
        %token,
        %spender,
        %current,
        %required,
        "allowance insufficient, submitting approval"
    );

    let approval = ContractCall::new(token, encode_approve_call(spender, U256::MAX));
    let handle = match submitter.send_contract_tx(session, &approval).await? {
        SubmitOutcome::Submitted { handle } => handle,
        SubmitOutcome::Canceled => return Ok(AllowanceOutcome::Canceled),
    };

    match waiter
        .wait_for_tx(handle, Some(APPROVAL_EVENT_SIGNATURE))
        .await
    {
        ConfirmationResult::Confirmed { receipt } => Ok(AllowanceOutcome::Approved { receipt }),
        ConfirmationResult::Reverted { receipt } => Err(OrchestratorError::Reverted {
            transaction_hash: Some(receipt.transaction_hash.to_string()),
            message: "approval transaction reverted".to_string(),
        }),
        ConfirmationResult::Unknown { reason } => Err(OrchestratorError::SubmissionFailed {
            transport: session.transport_kind,
            message: format!("approval could not be confirmed: {reason}"),
        }),
    }
}

pub async fn read_allowance<C: ChainRead + ?Sized>(
    chain: &C,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256, OrchestratorError> {
    let data = encode_allowance_call(owner, spender);
    let raw = chain.call(token, data).await?;
    decode_u256(&raw)
}

pub fn encode_allowance_call(owner: Address, spender: Address) -> Bytes {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&ALLOWANCE_SELECTOR);
    data.extend_from_slice(&pad_address(owner));
    data.extend_from_slice(&pad_address(spender));
    Bytes::from(data)
}

pub fn encode_approve_call(spender: Address, amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&APPROVE_SELECTOR);
    data.extend_from_slice(&pad_address(spender));
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    Bytes::from(data)
}

fn decode_u256(raw: &Bytes) -> Result<U256, OrchestratorError> {
    if raw.len() < 32 {
        return Err(OrchestratorError::validation(format!(
            "allowance call returned {} bytes, expected 32",
            raw.len()
        )));
    }
    Ok(U256::from_be_slice(&raw[..32]))
}

fn pad_address(address: Address) -> [u8; 32] {
    let mut padded = [0u8; 32];
    padded[12..].copy_from_slice(address.as_slice());
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn allowance_calldata_layout() {
        let owner = address!("1111111111111111111111111111111111111111");
        let spender = address!("2222222222222222222222222222222222222222");
        let data = encode_allowance_call(owner, spender);

        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &ALLOWANCE_SELECTOR);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(&data[16..36], owner.as_slice());
        assert_eq!(&data[48..68], spender.as_slice());
    }

    #[test]
    fn approve_calldata_layout() {
        let spender = address!("2222222222222222222222222222222222222222");
        let data = encode_approve_call(spender, U256::MAX);

        assert_eq!(data.len(), 68);
        assert_eq!(&data[..4], &APPROVE_SELECTOR);
        assert_eq!(&data[16..36], spender.as_slice());
        assert!(data[36..].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn u256_decoding() {
        let value = U256::from(123456u64);
        let raw = Bytes::from(value.to_be_bytes::<32>().to_vec());
        assert_eq!(decode_u256(&raw).unwrap(), value);

        assert!(decode_u256(&Bytes::from(vec![0u8; 4])).is_err());
    }
}
