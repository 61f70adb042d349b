use std::time::Duration;

use alloy::primitives::{B256, b256};

/// ERC-20 `allowance(address,address)` selector.
pub const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// ERC-20 `approve(address,uint256)` selector.
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// ERC-20 `Approval(address,address,uint256)` event signature.
pub const APPROVAL_EVENT_SIGNATURE: B256 =
    b256!("8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925");

/// Interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Receipt poll attempts before giving up (~90s at the default interval).
pub const DEFAULT_MAX_RECEIPT_ATTEMPTS: u32 = 60;

/// Log-recovery scan attempts for hashless handles.
pub const DEFAULT_MAX_LOG_SCAN_ATTEMPTS: u32 = 20;

/// Widest block window a log-recovery scan may cover past its anchor.
pub const DEFAULT_LOG_SCAN_WINDOW: u64 = 500;

/// How long a terminal status must stay visible before the UI may clear it.
pub const MIN_STATUS_DISPLAY: Duration = Duration::from_secs(4);
