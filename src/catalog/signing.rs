//! Request signing for the catalog API.

use md5::{Digest, Md5};

/// Query credentials attached to every catalog request.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub public_key: String,
  pub ts: String,
  pub hash: String,
}

impl Credentials {
  /// Sign with a private key: `md5(ts + private + public)` as lowercase hex.
  pub fn sign(public_key: &str, private_key: &str, ts: &str) -> Self {
    Self {
      public_key: public_key.to_string(),
      ts: ts.to_string(),
      hash: signature(ts, private_key, public_key),
    }
  }

  /// Use a precomputed hash as-is.
  pub fn precomputed(public_key: &str, ts: &str, hash: &str) -> Self {
    Self {
      public_key: public_key.to_string(),
      ts: ts.to_string(),
      hash: hash.to_string(),
    }
  }
}

fn signature(ts: &str, private_key: &str, public_key: &str) -> String {
  let mut hasher = Md5::new();
  hasher.update(ts.as_bytes());
  hasher.update(private_key.as_bytes());
  hasher.update(public_key.as_bytes());
  hex::encode(hasher.finalize())
}
