// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EcoID registry contract client.
//!
//! `register` stores the exported attestation document on-chain; `mint`
//! issues the EcoID token and reports its id through the `EcoIdMinted` event.
//! Transactions are signed by the connected wallet's key.

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionReceipt,
    sol,
};

use super::types::{NetworkConfig, TokenId, TxReceipt};
use super::ContractGateway;
use crate::attestation::{AttestationRecord, AttestationSignature};
use crate::error::ContractError;
use crate::file_transfer;

sol! {
    /// Parameters of an EcoID mint.
    struct EcoIdParams {
        address recipient;
        address verifier;
        uint64 deadline;
        bool revocable;
        string claim;
        bytes verifierSignature;
        bytes receiverSignature;
    }

    #[sol(rpc)]
    interface IEcoIdRegistry {
        event EcoIdMinted(address indexed recipient, uint256 indexed tokenId);

        function register(bytes calldata attestation) external;
        function mint(EcoIdParams calldata params) external returns (uint256 tokenId);
    }
}

/// Registry contract gateway over an HTTP provider.
pub struct RegistryGateway {
    network: NetworkConfig,
    registry: Address,
    provider: DynProvider,
}

impl RegistryGateway {
    /// Create a gateway that signs transactions with `wallet`.
    pub fn new(network: NetworkConfig, registry: Address, wallet: EthereumWallet) -> Self {
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(network.rpc_url.clone())
            .erased();

        Self {
            network,
            registry,
            provider,
        }
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Registry binding, once the endpoint is known to serve the configured chain.
    async fn contract(
        &self,
    ) -> Result<IEcoIdRegistry::IEcoIdRegistryInstance<DynProvider>, ContractError> {
        if self.registry.is_zero() {
            return Err(ContractError::NetworkError(
                "registry contract address is not configured".to_string(),
            ));
        }
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| ContractError::NetworkError(e.to_string()))?;
        check_chain_id(self.network.chain_id, chain_id)?;

        Ok(IEcoIdRegistry::new(self.registry, self.provider.clone()))
    }
}

impl ContractGateway for RegistryGateway {
    async fn register(&self, record: &AttestationRecord) -> Result<TxReceipt, ContractError> {
        let contract = self.contract().await?;
        let document = file_transfer::export(record)
            .map_err(|e| ContractError::Revert(format!("cannot encode attestation: {e}")))?;

        tracing::info!(
            network = %self.network.name,
            registry = %self.registry,
            recipient = %record.message().recipient,
            "Submitting register transaction"
        );

        let pending = contract
            .register(Bytes::from(document.bytes))
            .send()
            .await
            .map_err(classify_error)?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ContractError::NetworkError(e.to_string()))?;

        ensure_success(&receipt, "register")?;
        Ok(to_receipt(&receipt))
    }

    async fn mint(&self, record: &AttestationRecord) -> Result<TokenId, ContractError> {
        let contract = self.contract().await?;

        tracing::info!(
            network = %self.network.name,
            registry = %self.registry,
            recipient = %record.message().recipient,
            "Submitting mint transaction"
        );

        let pending = contract
            .mint(mint_params(record))
            .send()
            .await
            .map_err(classify_error)?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ContractError::NetworkError(e.to_string()))?;

        ensure_success(&receipt, "mint")?;
        receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<IEcoIdRegistry::EcoIdMinted>().ok())
            .map(|event| event.inner.data.tokenId)
            .ok_or_else(|| {
                ContractError::Revert("mint receipt carries no EcoIdMinted event".to_string())
            })
    }
}

/// Contract arguments for minting `record`.
fn mint_params(record: &AttestationRecord) -> EcoIdParams {
    let message = record.message();
    let signature_bytes = |signature: Option<&AttestationSignature>| {
        signature
            .map(|s| s.signature.clone())
            .unwrap_or_default()
    };
    let deadline = message
        .deadline
        .and_hms_opt(23, 59, 59)
        .map(|end_of_day| end_of_day.and_utc().timestamp())
        .unwrap_or_default()
        .max(0) as u64;

    EcoIdParams {
        recipient: message.recipient,
        verifier: message.verifier,
        deadline,
        revocable: message.revocable,
        claim: message.claim.clone(),
        verifierSignature: signature_bytes(record.verifier_signature()),
        receiverSignature: signature_bytes(record.receiver_signature()),
    }
}

fn ensure_success(receipt: &TransactionReceipt, call: &str) -> Result<(), ContractError> {
    if receipt.status() {
        Ok(())
    } else {
        Err(ContractError::Revert(format!(
            "{call} transaction {:?} reverted",
            receipt.transaction_hash
        )))
    }
}

fn to_receipt(receipt: &TransactionReceipt) -> TxReceipt {
    TxReceipt {
        tx_hash: format!("{:?}", receipt.transaction_hash),
        block_number: receipt.block_number.unwrap_or(0),
        gas_used: receipt.gas_used,
        success: receipt.status(),
    }
}

fn check_chain_id(expected: u64, actual: u64) -> Result<(), ContractError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ContractError::NetworkError(format!(
            "RPC endpoint serves chain {actual}, expected {expected}"
        )))
    }
}

/// Map a node or contract error onto the gateway error kinds.
fn classify_error(error: impl std::fmt::Display) -> ContractError {
    let message = error.to_string();
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("insufficient funds") {
        ContractError::InsufficientFunds
    } else if lowered.contains("revert") {
        ContractError::Revert(message)
    } else {
        ContractError::NetworkError(message)
    }
}
