use {
    rand::RngCore,
    std::{collections::HashSet, fmt::Write, sync::Mutex},
};

/// Bytes of randomness behind an attachment identifier (16 hex chars).
const ATTACHMENT_ID_BYTES: usize = 8;

/// Lowercase hex string built from `len` random bytes.
pub(crate) fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes
        .iter()
        .fold(String::with_capacity(len * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// Issues attachment identifiers for one encoded call. Identifiers are
/// pairwise distinct within a registry; a colliding draw is repeated.
#[derive(Debug, Default)]
pub struct AttachmentIds {
    issued: Mutex<HashSet<String>>,
}

impl AttachmentIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            let id = random_hex(ATTACHMENT_ID_BYTES);
            if issued.insert(id.clone()) {
                return id;
            }
        }
    }

    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// `attach://<id>` reference pointing at a part named `<id>`.
#[must_use]
pub fn attach_ref(id: &str) -> String {
    format!("attach://{id}")
}
