//! Action providers against mocked HTTP services

use std::sync::Arc;

use ethers_core::abi::{encode, Token};
use ethers_core::types::U256;
use mockito::Matcher;
use secrecy::SecretString;
use serde_json::json;

use web3_chat_server::{
    agent::{
        providers::{
            contract::{READ_CONTRACT, WRITE_CONTRACT},
            nodit::{GET_BLOCK, GET_TOKEN_BALANCES, GET_TOKEN_TRANSFERS, GET_TRANSACTION},
            token_details::GET_TOKEN_DETAILS,
            ContractInteractor, NoditProvider, TokenDetailsProvider,
        },
        ActionProvider,
    },
    blockchain::{get_chain, ContractRegistry, WalletClient},
};

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ACCOUNT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
const TOKEN: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

fn nodit(base_url: &str) -> NoditProvider {
    NoditProvider::new(SecretString::new("test-key".to_string()), base_url)
}

fn abi_hex(tokens: &[Token]) -> String {
    format!("0x{}", hex::encode(encode(tokens)))
}

#[tokio::test]
async fn token_balances_pass_through_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ethereum/mainnet/token/getTokensOwnedByAccount")
        .match_header("x-api-key", "test-key")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::Json(json!({"accountAddress": ACCOUNT})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"items": [{"symbol": "USDC", "balance": "1000"}]}).to_string())
        .create_async()
        .await;

    let out = nodit(&server.url())
        .call(
            GET_TOKEN_BALANCES,
            json!({"network": "ethereum", "chainType": "mainnet", "accountAddress": ACCOUNT}),
        )
        .await;

    mock.assert_async().await;
    assert!(out.success);
    assert_eq!(out.data.unwrap()["items"][0]["symbol"], "USDC");
    assert_eq!(
        out.message.as_deref(),
        Some(format!("Retrieved token balances for account {}", ACCOUNT).as_str())
    );
}

#[tokio::test]
async fn token_transfers_send_only_meaningful_filters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/base/mainnet/token/getTokenTransfersByAccount")
        .match_body(Matcher::Json(json!({
            "accountAddress": ACCOUNT,
            "fromDate": "2025-01-01T00:00:00+00:00",
            "limit": 20
        })))
        .with_status(200)
        .with_body(r#"{"items": []}"#)
        .create_async()
        .await;

    let out = nodit(&format!("{}/", server.url()))
        .call(
            GET_TOKEN_TRANSFERS,
            json!({
                "network": "base",
                "chainType": "mainnet",
                "accountAddress": ACCOUNT,
                "fromDate": "2025-01-01T00:00:00+00:00",
                "toDate": "",
                "limit": 20,
                "offset": 0
            }),
        )
        .await;

    mock.assert_async().await;
    assert!(out.success, "{:?}", out.error);
}

#[tokio::test]
async fn api_errors_carry_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/ethereum/mainnet/block/getBlockByNumber")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_body(r#"{"message":"bad key"}"#)
        .create_async()
        .await;

    let out = nodit(&server.url())
        .call(
            GET_BLOCK,
            json!({"network": "ethereum", "chainType": "mainnet", "blockNumber": 19000000}),
        )
        .await;

    assert!(!out.success);
    assert_eq!(
        out.error.as_deref(),
        Some(r#"Nodit API error: 401 Unauthorized - {"message":"bad key"}"#)
    );
}

#[tokio::test]
async fn transaction_lookup_and_transport_failure() {
    let hash = format!("0x{}", "ab".repeat(32));
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/polygon/testnet/transaction/getTransactionByHash")
        .match_body(Matcher::Json(json!({"transactionHash": hash})))
        .with_status(200)
        .with_body(json!({"transactionHash": hash, "status": 1}).to_string())
        .create_async()
        .await;

    let args = json!({"network": "polygon", "chainType": "testnet", "transactionHash": hash});
    let out = nodit(&server.url()).call(GET_TRANSACTION, args.clone()).await;
    assert!(out.success);
    assert_eq!(out.message.unwrap(), format!("Retrieved transaction {} details", hash));

    let offline = nodit("http://127.0.0.1:1").call(GET_TRANSACTION, args).await;
    assert!(!offline.success);
    assert!(offline.error.is_some());
}

#[tokio::test]
async fn unsafe_network_names_never_reach_the_api() {
    let mut server = mockito::Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let provider = nodit(&server.url());
    for (network, chain_type) in [("../token", "mainnet"), ("ethereum", "mainnet/../../x"), ("ethereum", "main%2Fnet")] {
        let out = provider
            .call(
                GET_TOKEN_BALANCES,
                json!({"network": network, "chainType": chain_type, "accountAddress": ACCOUNT}),
            )
            .await;
        assert!(!out.success);
        assert!(out.error.unwrap().starts_with("Invalid input"));
    }
    any.assert_async().await;
}

#[tokio::test]
async fn connection_check_hits_health_endpoint() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/health")
        .with_status(200)
        .create_async()
        .await;

    let out = nodit(&server.url()).test_connection().await;
    assert!(out.success);
    assert_eq!(out.message.as_deref(), Some("Nodit API is accessible"));
}

fn rpc_reply(id: u64, result: String) -> serde_json::Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn wallet_at(url: &str) -> Arc<WalletClient> {
    let chain = get_chain(84532).unwrap();
    Arc::new(WalletClient::new(&SecretString::new(DEV_KEY.to_string()), chain, url).unwrap())
}

#[tokio::test]
async fn token_details_read_erc20_fields_in_one_batch() {
    let mut server = mockito::Server::new_async().await;
    // Replies arrive out of order and are matched back by id
    let replies = json!([
        rpc_reply(5, abi_hex(&[Token::Uint(U256::from(42))])),
        rpc_reply(1, abi_hex(&[Token::String("USD Coin".into())])),
        rpc_reply(4, abi_hex(&[Token::Uint(U256::from(1_000_000_000u64))])),
        rpc_reply(2, abi_hex(&[Token::String("USDC".into())])),
        rpc_reply(3, abi_hex(&[Token::Uint(U256::from(6))])),
    ]);
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r"^\[".into()),
            Matcher::Regex("0x06fdde03".into()),
            Matcher::Regex("0x95d89b41".into()),
            Matcher::Regex("0x313ce567".into()),
            Matcher::Regex("0x18160ddd".into()),
            Matcher::Regex("0x70a08231".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(replies.to_string())
        .expect(1)
        .create_async()
        .await;

    let provider = TokenDetailsProvider::new(wallet_at(&server.url()));
    let out = provider
        .call(GET_TOKEN_DETAILS, json!({"contractAddress": TOKEN}))
        .await;

    mock.assert_async().await;
    assert!(out.success, "{:?}", out.error);
    let data = out.data.unwrap();
    assert_eq!(data["name"], "USD Coin");
    assert_eq!(data["symbol"], "USDC");
    assert_eq!(data["decimals"], 6);
    assert_eq!(data["totalSupply"], "1000000000");
    assert_eq!(data["balance"], "42");
    assert_eq!(data["chainId"], 84532);
}

#[tokio::test]
async fn token_details_reject_non_tokens() {
    let mut server = mockito::Server::new_async().await;
    let reverted: Vec<serde_json::Value> = (1..=5)
        .map(|id| json!({"jsonrpc": "2.0", "id": id, "error": {"code": 3, "message": "execution reverted"}}))
        .collect();
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(json!(reverted).to_string())
        .create_async()
        .await;

    let provider = TokenDetailsProvider::new(wallet_at(&server.url()));
    let out = provider
        .call(GET_TOKEN_DETAILS, json!({"contractAddress": TOKEN}))
        .await;
    assert!(!out.success);
    assert!(out.error.unwrap().contains("does not look like an ERC20 token on Base Sepolia"));

    let bad = provider
        .call(GET_TOKEN_DETAILS, json!({"contractAddress": "0x123"}))
        .await;
    assert!(bad.error.unwrap().starts_with("Invalid input"));

    let offline = TokenDetailsProvider::new(wallet_at("http://127.0.0.1:1"))
        .call(GET_TOKEN_DETAILS, json!({"contractAddress": TOKEN}))
        .await;
    assert!(!offline.success);
    assert!(offline.error.is_some());
}

const GREETER: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn greeter_registry() -> ContractRegistry {
    let doc = json!({
        "84532": {
            "Greeter": {
                "address": GREETER,
                "abi": [
                    {
                        "type": "function",
                        "name": "greet",
                        "inputs": [],
                        "outputs": [{"name": "", "type": "string"}],
                        "stateMutability": "view"
                    },
                    {
                        "type": "function",
                        "name": "setGreeting",
                        "inputs": [{"name": "_greeting", "type": "string"}],
                        "outputs": [],
                        "stateMutability": "nonpayable"
                    }
                ]
            }
        }
    });
    ContractRegistry::from_json(&doc.to_string()).unwrap()
}

async fn mock_rpc_method(server: &mut mockito::ServerGuard, method: &str, result: &str) -> mockito::Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::Regex(format!("\"method\":\"{}\"", method)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string())
        .create_async()
        .await
}

#[tokio::test]
async fn contract_read_decodes_the_return_value() {
    let mut server = mockito::Server::new_async().await;
    let greeting = abi_hex(&[Token::String("Hello, Base".into())]);
    let call = mock_rpc_method(&mut server, "eth_call", &greeting).await;

    let provider = ContractInteractor::new(84532, greeter_registry(), wallet_at(&server.url()));
    let out = provider
        .call(
            READ_CONTRACT,
            json!({"contractName": "Greeter", "functionName": "greet", "functionArgs": []}),
        )
        .await;

    call.assert_async().await;
    assert!(out.success, "{:?}", out.error);
    let data = out.data.unwrap();
    assert_eq!(data["contractName"], "Greeter");
    assert_eq!(data["functionName"], "greet");
    assert_eq!(data["result"], "Hello, Base");
    assert_eq!(
        out.message.as_deref(),
        Some("Result of greet on Greeter: Hello, Base")
    );
}

#[tokio::test]
async fn contract_write_signs_and_broadcasts() {
    let tx_hash = format!("0x{}", "cd".repeat(32));
    let mut server = mockito::Server::new_async().await;
    let nonce = mock_rpc_method(&mut server, "eth_getTransactionCount", "0x7").await;
    let gas = mock_rpc_method(&mut server, "eth_estimateGas", "0x7530").await;
    let price = mock_rpc_method(&mut server, "eth_gasPrice", "0x3b9aca00").await;
    let broadcast = mock_rpc_method(&mut server, "eth_sendRawTransaction", &tx_hash).await;

    let provider = ContractInteractor::new(84532, greeter_registry(), wallet_at(&server.url()));
    let out = provider
        .call(
            WRITE_CONTRACT,
            json!({
                "contractName": "Greeter",
                "functionName": "setGreeting",
                "functionArgs": ["gm"]
            }),
        )
        .await;

    for mock in [nonce, gas, price, broadcast] {
        mock.assert_async().await;
    }
    assert!(out.success, "{:?}", out.error);
    let data = out.data.unwrap();
    assert_eq!(data["functionName"], "setGreeting");
    assert_eq!(data["hash"], tx_hash.as_str());
    assert_eq!(
        out.message.unwrap(),
        format!("Sent setGreeting on Greeter: {}", tx_hash)
    );
}
