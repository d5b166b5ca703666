// src/blockchain/abi.rs

use anyhow::{anyhow, Result};
use ethers_core::abi::token::{LenientTokenizer, Tokenizer};
use ethers_core::abi::{decode, encode, Abi, Function, ParamType, Token};
use ethers_core::types::{Bytes, U256};
use ethers_core::utils::keccak256;
use serde_json::{json, Value};

fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

/// Encodes calldata for a human-readable signature like `balanceOf(address)`.
pub fn encode_call(sig: &str, tokens: Vec<Token>) -> Bytes {
    let mut out = selector(sig).to_vec();
    out.extend(encode(&tokens));
    Bytes::from(out)
}

pub fn hex_to_bytes(v: &Value) -> Result<Vec<u8>> {
    let s = v.as_str().ok_or_else(|| anyhow!("eth_call result not string"))?;
    let s = s.strip_prefix("0x").unwrap_or(s);
    Ok(hex::decode(s)?)
}

pub fn decode_string(v: &Value) -> Option<String> {
    let bytes = hex_to_bytes(v).ok()?;
    if let Ok(tokens) = decode(&[ParamType::String], &bytes) {
        if let Some(Token::String(s)) = tokens.first() {
            return Some(s.clone());
        }
    }
    // Some older tokens return bytes32 instead of string
    if let Ok(tokens) = decode(&[ParamType::FixedBytes(32)], &bytes) {
        if let Some(Token::FixedBytes(b)) = tokens.first() {
            return String::from_utf8(b.iter().copied().take_while(|c| *c != 0).collect()).ok();
        }
    }
    None
}

pub fn decode_u256(v: &Value) -> Option<U256> {
    let bytes = hex_to_bytes(v).ok()?;
    match decode(&[ParamType::Uint(256)], &bytes).ok()?.first() {
        Some(Token::Uint(n)) => Some(*n),
        _ => None,
    }
}

/// Parses a JSON ABI and finds the named function.
pub fn find_function<'a>(abi: &'a Abi, function_name: &str) -> Result<&'a Function> {
    abi.functions()
        .find(|f| f.name == function_name)
        .ok_or_else(|| anyhow!("function '{}' not found in ABI", function_name))
}

/// Turns string arguments into ABI tokens using the function's declared input types.
pub fn tokenize_args(func: &Function, args: &[String]) -> Result<Vec<Token>> {
    if func.inputs.len() != args.len() {
        return Err(anyhow!(
            "arg count mismatch for {}: expected {}, got {}",
            func.name,
            func.inputs.len(),
            args.len()
        ));
    }
    func.inputs
        .iter()
        .zip(args)
        .map(|(param, raw)| {
            LenientTokenizer::tokenize(&param.kind, raw)
                .map_err(|e| anyhow!("invalid value '{}' for {} ({}): {}", raw, param.name, param.kind, e))
        })
        .collect()
}

pub fn encode_function_call(func: &Function, args: &[String]) -> Result<Bytes> {
    let tokens = tokenize_args(func, args)?;
    Ok(Bytes::from(func.encode_input(&tokens)?))
}

/// JSON rendering of decoded return values; integers become decimal strings.
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(a) => json!(ethers_core::utils::to_checksum(a, None)),
        Token::FixedBytes(b) | Token::Bytes(b) => json!(format!("0x{}", hex::encode(b))),
        Token::Int(n) => json!(ethers_core::types::I256::from_raw(*n).to_string()),
        Token::Uint(n) => json!(n.to_string()),
        Token::Bool(b) => json!(b),
        Token::String(s) => json!(s),
        Token::FixedArray(items) | Token::Array(items) | Token::Tuple(items) => {
            Value::Array(items.iter().map(token_to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_ABI: &str = r#"[
        {"inputs":[{"name":"owner","type":"address"}],"name":"balanceOf","outputs":[{"name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
        {"inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"name":"transfer","outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable","type":"function"}
    ]"#;

    #[test]
    fn encodes_known_selector() {
        let data = encode_call("totalSupply()", vec![]);
        assert_eq!(hex::encode(&data), "18160ddd");
    }

    #[test]
    fn tokenizes_string_args_against_abi() {
        let abi: Abi = serde_json::from_str(ERC20_ABI).unwrap();
        let func = find_function(&abi, "transfer").unwrap();
        let data = encode_function_call(
            func,
            &[
                "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string(),
                "1000".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(&data[..4], &selector("transfer(address,uint256)"));
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn rejects_wrong_arity_and_unknown_function() {
        let abi: Abi = serde_json::from_str(ERC20_ABI).unwrap();
        let func = find_function(&abi, "balanceOf").unwrap();
        assert!(tokenize_args(func, &[]).is_err());
        assert!(find_function(&abi, "mint").is_err());
    }

    #[test]
    fn decodes_string_and_bytes32_names() {
        let encoded = encode(&[Token::String("Wrapped Ether".into())]);
        let v = json!(format!("0x{}", hex::encode(encoded)));
        assert_eq!(decode_string(&v).as_deref(), Some("Wrapped Ether"));

        let mut raw = [0u8; 32];
        raw[..3].copy_from_slice(b"MKR");
        let v = json!(format!("0x{}", hex::encode(raw)));
        assert_eq!(decode_string(&v).as_deref(), Some("MKR"));
    }
}
