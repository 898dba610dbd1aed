//! CLI commands for the ledger
//!
//! Each handler writes its report to the given writer so it can be tested
//! without a terminal.

use crate::config::LedgerConfig;
use crate::core::{ReadableTransaction, Transaction, UnspentPool, UxOut};
use crate::crypto::KeyPair;
use crate::mining::Mempool;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Generate `count` fresh key pairs
pub fn cmd_keygen(out: &mut impl Write, config: &LedgerConfig, count: u32) -> CliResult<()> {
    for _ in 0..count {
        let kp = KeyPair::generate();
        writeln!(out, "secret:  {}", kp.secret_hex())?;
        writeln!(out, "public:  {}", kp.public_hex())?;
        writeln!(out, "address: {}", kp.address(config.address_version))?;
        writeln!(out)?;
    }
    log::info!("Generated {} key pair(s)", count);
    Ok(())
}

/// Derive the address of a secret key
pub fn cmd_address(out: &mut impl Write, config: &LedgerConfig, secret: &str) -> CliResult<()> {
    let kp = KeyPair::from_secret_hex(secret)?;
    writeln!(out, "{}", kp.address(config.address_version))?;
    Ok(())
}

/// Decode a hex transaction, print it and its verification verdict.
/// Returns whether it verified.
pub fn cmd_decode(out: &mut impl Write, tx_hex: &str) -> CliResult<bool> {
    let bytes = hex::decode(tx_hex.trim())?;
    let tx = Transaction::deserialize(&bytes)?;

    let readable = ReadableTransaction::from(&tx);
    writeln!(out, "{}", serde_json::to_string_pretty(&readable)?)?;

    match tx.verify() {
        Ok(()) => {
            writeln!(out, "verify: ok")?;
            Ok(true)
        }
        Err(e) => {
            log::warn!("Transaction {} failed verification: {}", readable.txid, e);
            writeln!(out, "verify: {:?} error: {}", e.kind(), e)?;
            Ok(false)
        }
    }
}

/// Load an unspent output set from a JSON array of outputs
pub fn load_unspent(path: &Path) -> CliResult<UnspentPool> {
    let data = fs::read_to_string(path)?;
    let outputs: Vec<UxOut> = serde_json::from_str(&data)?;
    let mut unspent = UnspentPool::new();
    for ux in outputs {
        unspent.add(ux);
    }
    log::debug!("Loaded {} unspent outputs from {}", unspent.len(), path.display());
    Ok(unspent)
}

/// Admit hex transactions into a mempool sized by the config, then print the
/// block candidate cut to `max_block_size`. Returns how many were admitted.
pub fn cmd_pack(
    out: &mut impl Write,
    config: &LedgerConfig,
    unspent: &UnspentPool,
    txs_hex: &[String],
) -> CliResult<usize> {
    let mut mempool = Mempool::new(config.max_mempool_transactions);

    for (i, tx_hex) in txs_hex.iter().enumerate() {
        let bytes = hex::decode(tx_hex.trim())?;
        let tx = Transaction::deserialize(&bytes)?;
        match mempool.add_transaction(tx, unspent) {
            Ok(hash) => writeln!(out, "accepted #{} {}", i, hash)?,
            Err(e) => writeln!(out, "rejected #{}: {}", i, e)?,
        }
    }

    let candidate = mempool.create_block_candidate(unspent, config.max_block_size);
    writeln!(
        out,
        "block: {} of {} transactions, {} of {} bytes",
        candidate.len(),
        mempool.len(),
        candidate.size(),
        config.max_block_size
    )?;
    for hash in candidate.hashes() {
        writeln!(out, "  include {}", hash)?;
    }
    Ok(mempool.len())
}

/// Print the effective configuration
pub fn cmd_config(out: &mut impl Write, config: &LedgerConfig) -> CliResult<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::tests::{addr, signed_tx};
    use crate::core::UxBody;
    use crate::crypto::{sum_sha256, Address};
    use tempfile::TempDir;

    fn genesis(owner: &KeyPair, seed: &[u8], hours: u64) -> UxOut {
        UxOut {
            body: UxBody {
                src_transaction: sum_sha256(seed),
                address: owner.address(0),
                coins: 1_000_000,
                hours,
            },
        }
    }

    fn spend(ux: &UxOut, owner: &KeyPair, hours: u64) -> String {
        let mut tx = Transaction::new();
        tx.push_input(ux.hash()).unwrap();
        tx.push_output(owner.address(0), 1_000_000, hours).unwrap();
        tx.update_header().unwrap();
        tx.sign_inputs(&[owner.secret_key]).unwrap();
        hex::encode(tx.serialize())
    }

    fn txid(tx_hex: &str) -> String {
        Transaction::deserialize(&hex::decode(tx_hex).unwrap())
            .unwrap()
            .hash()
            .to_hex()
    }

    #[test]
    fn test_keygen_output() {
        let mut out = Vec::new();
        cmd_keygen(&mut out, &LedgerConfig::default(), 2).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("address: ").count(), 2);
    }

    #[test]
    fn test_address_matches_key() {
        let kp = KeyPair::generate();
        let mut out = Vec::new();
        cmd_address(&mut out, &LedgerConfig::default(), &kp.secret_hex()).unwrap();
        let printed: Address = String::from_utf8(out).unwrap().trim().parse().unwrap();
        assert_eq!(printed, kp.address(0));

        assert!(cmd_address(&mut Vec::new(), &LedgerConfig::default(), "xyz").is_err());
    }

    #[test]
    fn test_decode_reports_verdict() {
        let good = signed_tx(&[sum_sha256(b"a")], &[(addr(), 1_000_000, 0)]);
        let mut out = Vec::new();
        assert!(cmd_decode(&mut out, &hex::encode(good.serialize())).unwrap());
        assert!(String::from_utf8(out).unwrap().contains(&good.hash().to_hex()));

        let bad = signed_tx(&[sum_sha256(b"a")], &[(addr(), 1_500_000, 0)]);
        let mut out = Vec::new();
        assert!(!cmd_decode(&mut out, &hex::encode(bad.serialize())).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("Policy"));

        assert!(cmd_decode(&mut Vec::new(), "abcd").is_err());
    }

    #[test]
    fn test_pack_uses_block_budget() {
        let owner = KeyPair::generate();
        let cheap_ux = genesis(&owner, b"cheap", 100);
        let rich_ux = genesis(&owner, b"rich", 100);
        let mut unspent = UnspentPool::new();
        unspent.add(cheap_ux);
        unspent.add(rich_ux);

        let cheap = spend(&cheap_ux, &owner, 90);
        let rich = spend(&rich_ux, &owner, 60);

        // Room for one single-input transaction only
        let config = LedgerConfig {
            max_block_size: 200,
            ..Default::default()
        };
        let mut out = Vec::new();
        let admitted = cmd_pack(&mut out, &config, &unspent, &[cheap.clone(), rich.clone()]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(admitted, 2);
        assert!(text.contains("block: 1 of 2 transactions"));
        assert!(text.contains(&format!("include {}", txid(&rich))));
        assert!(!text.contains(&format!("include {}", txid(&cheap))));
    }

    #[test]
    fn test_pack_respects_mempool_capacity() {
        let owner = KeyPair::generate();
        let a = genesis(&owner, b"a", 10);
        let b = genesis(&owner, b"b", 10);
        let mut unspent = UnspentPool::new();
        unspent.add(a);
        unspent.add(b);

        let config = LedgerConfig {
            max_mempool_transactions: 1,
            ..Default::default()
        };
        let mut out = Vec::new();
        let admitted =
            cmd_pack(&mut out, &config, &unspent, &[spend(&a, &owner, 0), spend(&b, &owner, 0)]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(admitted, 1);
        assert!(text.contains("rejected #1: Mempool full"));
        assert!(text.contains("block: 1 of 1 transactions"));
    }

    #[test]
    fn test_load_unspent() {
        let owner = KeyPair::generate();
        let outputs = vec![genesis(&owner, b"a", 1), genesis(&owner, b"b", 2)];
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("unspent.json");
        fs::write(&path, serde_json::to_string(&outputs).unwrap()).unwrap();

        let unspent = load_unspent(&path).unwrap();
        assert_eq!(unspent.len(), 2);
        assert!(unspent.contains(&outputs[1].hash()));

        fs::write(&path, "[{}]").unwrap();
        assert!(load_unspent(&path).is_err());
    }

    #[test]
    fn test_config_prints_json() {
        let mut out = Vec::new();
        cmd_config(&mut out, &LedgerConfig::default()).unwrap();
        let parsed: LedgerConfig = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, LedgerConfig::default());
    }
}
