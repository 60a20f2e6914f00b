use alloy::primitives::address;

use crate::data::types::NetworkConfig;

/// Supported networks, in the order their cards are laid out.
pub static NETWORKS: [NetworkConfig; 3] = [
    NetworkConfig {
        id: "base",
        name: "Base",
        chain_id: 8453,
        contract_address: address!("4cA7cdA1A56bd2e9247f832BB863f92De53B16FD"),
        color: "#1a1a1a",
        logo: "img/base.jpg",
        rpc_urls: &[
            "https://mainnet.base.org",
            "https://base.publicnode.com",
            "https://1rpc.io/base",
        ],
        explorer_url: "https://basescan.org",
        currency: "ETH",
    },
    NetworkConfig {
        id: "celo",
        name: "Celo",
        chain_id: 42220,
        contract_address: address!("316bBce718B16818434cD5E185Cec820086cf1fe"),
        color: "#35d07f",
        logo: "img/celo.logo.png",
        rpc_urls: &["https://forno.celo.org"],
        explorer_url: "https://celoscan.io",
        currency: "CELO",
    },
    NetworkConfig {
        id: "optimism",
        name: "Optimism",
        chain_id: 10,
        contract_address: address!("669364218144b85975218271f6001CA80d77781f"),
        color: "#ff0000",
        logo: "img/optimism.svg",
        rpc_urls: &[
            "https://mainnet.optimism.io",
            "https://optimism.publicnode.com",
            "https://1rpc.io/op",
        ],
        explorer_url: "https://optimistic.etherscan.io",
        currency: "ETH",
    },
];

pub fn networks() -> &'static [NetworkConfig] {
    &NETWORKS
}

/// Look up a network by its id (case-insensitive, `op` is accepted for Optimism).
pub fn by_id(id: &str) -> Option<&'static NetworkConfig> {
    let id = match id.to_lowercase().as_str() {
        "op" => "optimism".to_string(),
        other => other.to_string(),
    };
    NETWORKS.iter().find(|n| n.id == id)
}

pub fn by_chain_id(chain_id: u64) -> Option<&'static NetworkConfig> {
    NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Position of a network's card in the layout.
pub fn index_of(id: &str) -> Option<usize> {
    let network = by_id(id)?;
    NETWORKS.iter().position(|n| n.id == network.id)
}
