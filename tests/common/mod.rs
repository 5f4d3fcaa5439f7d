//! Shared test helpers and utilities.
//!
//! Provides the token ABI fixture and factory functions for raw logs shaped
//! the way an RPC node returns them.

#![allow(dead_code)]

use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use tokenops_data::abi::parse_abi;
use tokenops_data::RawLogEntry;

/// Compiler artifact for a capped, pausable, role-managed ERC-20 token.
///
/// Only the event entries matter to the classifier; one function entry is
/// kept so the fixture looks like real compiler output.
pub const TOKEN_ARTIFACT: &str = r#"{
  "contractName": "CampusCredit",
  "abi": [
    {
      "type": "function",
      "name": "airdrop",
      "inputs": [
        { "name": "recipients", "type": "address[]", "internalType": "address[]" },
        { "name": "amounts", "type": "uint256[]", "internalType": "uint256[]" }
      ],
      "outputs": [],
      "stateMutability": "nonpayable"
    },
    {
      "type": "event",
      "name": "Transfer",
      "anonymous": false,
      "inputs": [
        { "name": "from", "type": "address", "indexed": true, "internalType": "address" },
        { "name": "to", "type": "address", "indexed": true, "internalType": "address" },
        { "name": "value", "type": "uint256", "indexed": false, "internalType": "uint256" }
      ]
    },
    {
      "type": "event",
      "name": "Approval",
      "anonymous": false,
      "inputs": [
        { "name": "owner", "type": "address", "indexed": true, "internalType": "address" },
        { "name": "spender", "type": "address", "indexed": true, "internalType": "address" },
        { "name": "value", "type": "uint256", "indexed": false, "internalType": "uint256" }
      ]
    },
    {
      "type": "event",
      "name": "RoleGranted",
      "anonymous": false,
      "inputs": [
        { "name": "role", "type": "bytes32", "indexed": true, "internalType": "bytes32" },
        { "name": "account", "type": "address", "indexed": true, "internalType": "address" },
        { "name": "sender", "type": "address", "indexed": true, "internalType": "address" }
      ]
    },
    {
      "type": "event",
      "name": "Paused",
      "anonymous": false,
      "inputs": [
        { "name": "account", "type": "address", "indexed": false, "internalType": "address" }
      ]
    },
    {
      "type": "event",
      "name": "Unpaused",
      "anonymous": false,
      "inputs": [
        { "name": "account", "type": "address", "indexed": false, "internalType": "address" }
      ]
    }
  ]
}"#;

/// Parses [`TOKEN_ARTIFACT`].
///
/// # Panics
/// Panics if the fixture is not valid ABI JSON (should never happen).
pub fn token_abi() -> JsonAbi {
    parse_abi(TOKEN_ARTIFACT).expect("token artifact fixture should parse")
}

/// Creates a Transfer log located at `block`.
///
/// # Example
/// ```ignore
/// let log = transfer_log(12, Address::ZERO, holder(1), U256::from(100));
/// ```
pub fn transfer_log(block: u64, from: Address, to: Address, value: U256) -> RawLogEntry {
    RawLogEntry::new(
        vec![
            keccak256("Transfer(address,address,uint256)"),
            from.into_word(),
            to.into_word(),
        ],
        word(value),
    )
    .with_provenance(block, tx_hash(block))
}

/// Creates an Approval log located at `block`.
pub fn approval_log(block: u64, owner: Address, spender: Address, value: U256) -> RawLogEntry {
    RawLogEntry::new(
        vec![
            keccak256("Approval(address,address,uint256)"),
            owner.into_word(),
            spender.into_word(),
        ],
        word(value),
    )
    .with_provenance(block, tx_hash(block))
}

/// Creates a RoleGranted log located at `block`.
pub fn role_granted_log(block: u64, role: B256, account: Address, sender: Address) -> RawLogEntry {
    RawLogEntry::new(
        vec![
            keccak256("RoleGranted(bytes32,address,address)"),
            role,
            account.into_word(),
            sender.into_word(),
        ],
        Bytes::new(),
    )
    .with_provenance(block, tx_hash(block))
}

/// Creates a Paused log located at `block`.
pub fn paused_log(block: u64, account: Address) -> RawLogEntry {
    RawLogEntry::new(
        vec![keccak256("Paused(address)")],
        account.into_word().to_vec(),
    )
    .with_provenance(block, tx_hash(block))
}

/// Creates a log emitted by some other contract, unknown to the token ABI.
pub fn foreign_log(block: u64) -> RawLogEntry {
    RawLogEntry::new(
        vec![keccak256("Swap(address,uint256,uint256)"), Address::ZERO.into_word()],
        word(U256::from(1_u8)),
    )
    .with_provenance(block, tx_hash(block))
}

/// Deterministic account address `0x00..00nn`.
pub fn holder(n: u8) -> Address {
    Address::with_last_byte(n)
}

/// Deterministic transaction hash for a block.
pub fn tx_hash(block: u64) -> B256 {
    B256::from(U256::from(block) + U256::from(0xabcd_0000_u64))
}

/// `n` whole tokens at 18 decimals.
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10_u64).pow(U256::from(18_u8))
}

fn word(value: U256) -> Vec<u8> {
    value.to_be_bytes::<32>().to_vec()
}
