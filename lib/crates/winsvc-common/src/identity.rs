//! Executable identity — what a service wrapper binary "is" for update purposes.
//!
//! Two strategies are supported and selected at configuration time:
//! content-hash equality (`checksum`) and ordered version comparison
//! (`version`). Both operate on the raw bytes of the executable, so the
//! same code identifies the bundled copy and the deployed copy.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// `VS_VERSIONINFO.szKey` as UTF-16LE, including the terminating NUL.
const VERSION_INFO_KEY: &[u8] = b"V\0S\0_\0V\0E\0R\0S\0I\0O\0N\0_\0I\0N\0F\0O\0\0\0";

/// `wLength`, `wValueLength` and `wType` precede the key.
const KEY_OFFSET: usize = 6;

/// Start of `VS_FIXEDFILEINFO` from the start of `VS_VERSIONINFO`: the header
/// and key (38 bytes) padded to a 32-bit boundary.
const FIXED_INFO_OFFSET: usize = 40;

/// `sizeof(VS_FIXEDFILEINFO)`.
const FIXED_INFO_LEN: usize = 52;

/// `VS_FIXEDFILEINFO.dwSignature` (0xFEEF04BD) as it appears on disk.
const FIXED_FILE_INFO_SIGNATURE: [u8; 4] = [0xBD, 0x04, 0xEF, 0xFE];

/// Offsets from the start of `VS_FIXEDFILEINFO`.
const STRUC_VERSION_OFFSET: usize = 4;
const FILE_VERSION_MS_OFFSET: usize = 8;
const FILE_VERSION_LS_OFFSET: usize = 12;

/// How two executables are compared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum IdentityStrategy {
    /// SHA-256 of the file contents. Any difference means "update".
    Checksum,
    /// File version from the embedded version resource. Never downgrades.
    #[default]
    Version,
}

impl IdentityStrategy {
    /// Extract the identity of an executable from its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Empty`] for a zero-length file and
    /// [`IdentityError::MissingVersionInfo`] when the version strategy finds
    /// no usable version resource.
    pub fn identify(self, bytes: &[u8]) -> Result<ExecutableIdentity, IdentityError> {
        if bytes.is_empty() {
            return Err(IdentityError::Empty);
        }
        match self {
            Self::Checksum => Ok(ExecutableIdentity::Checksum(sha256_hex(bytes))),
            Self::Version => file_version(bytes).map(ExecutableIdentity::Version),
        }
    }

    /// Lowercase name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checksum => "checksum",
            Self::Version => "version",
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one executable, tagged by the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ExecutableIdentity {
    /// Lowercase hex SHA-256 digest.
    Checksum(String),
    /// `major.minor.patch` from the version resource.
    Version(Version),
}

impl fmt::Display for ExecutableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checksum(digest) => write!(f, "sha256:{digest}"),
            Self::Version(version) => write!(f, "v{version}"),
        }
    }
}

/// Errors raised while identifying or comparing executables.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("executable is empty")]
    Empty,

    #[error("executable has no VS_FIXEDFILEINFO version resource")]
    MissingVersionInfo,

    #[error("cannot compare a {deployed} identity with a {bundled} identity")]
    StrategyMismatch {
        deployed: &'static str,
        bundled: &'static str,
    },
}

/// Why an update was or was not scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Deployed and bundled identities are equal.
    Identical,
    /// The deployed version is newer than the bundle.
    DeployedNewerOrEqual,
    /// Nothing is deployed at the target path.
    NoTarget,
    /// The deployed identity could not be read.
    Malformed,
    /// Checksums differ.
    ContentDiffers,
    /// The bundled version is newer.
    BundledNewer,
}

/// Result of comparing a deployed executable with the bundled one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDecision {
    pub should_update: bool,
    pub reason: DecisionReason,
}

impl UpdateDecision {
    #[must_use]
    pub const fn skip(reason: DecisionReason) -> Self {
        Self {
            should_update: false,
            reason,
        }
    }

    #[must_use]
    pub const fn update(reason: DecisionReason) -> Self {
        Self {
            should_update: true,
            reason,
        }
    }
}

/// Decide whether `bundled` should replace `deployed`.
///
/// Checksums: any difference schedules an update, regardless of direction.
/// Versions: only a strictly newer bundle schedules an update; a deployed
/// version newer than the bundle is never downgraded.
///
/// # Errors
///
/// Returns [`IdentityError::StrategyMismatch`] when the two identities were
/// produced by different strategies.
pub fn decide(
    deployed: &ExecutableIdentity,
    bundled: &ExecutableIdentity,
) -> Result<UpdateDecision, IdentityError> {
    match (deployed, bundled) {
        (ExecutableIdentity::Checksum(current), ExecutableIdentity::Checksum(ours)) => {
            if current == ours {
                Ok(UpdateDecision::skip(DecisionReason::Identical))
            } else {
                Ok(UpdateDecision::update(DecisionReason::ContentDiffers))
            }
        }
        (ExecutableIdentity::Version(current), ExecutableIdentity::Version(ours)) => {
            Ok(match ours.cmp(current) {
                Ordering::Greater => UpdateDecision::update(DecisionReason::BundledNewer),
                Ordering::Equal => UpdateDecision::skip(DecisionReason::Identical),
                Ordering::Less => UpdateDecision::skip(DecisionReason::DeployedNewerOrEqual),
            })
        }
        _ => Err(IdentityError::StrategyMismatch {
            deployed: kind(deployed),
            bundled: kind(bundled),
        }),
    }
}

const fn kind(identity: &ExecutableIdentity) -> &'static str {
    match identity {
        ExecutableIdentity::Checksum(_) => "checksum",
        ExecutableIdentity::Version(_) => "version",
    }
}

/// Read `major.minor.patch` from the `VS_VERSIONINFO` resource.
///
/// The fixed block is only trusted where the `VS_VERSION_INFO` key places it.
/// A bare `0xFEEF04BD` elsewhere in the image, such as a constant in code,
/// is ignored.
///
/// # Errors
///
/// Returns [`IdentityError::MissingVersionInfo`] when no key is followed by a
/// complete, well-formed fixed block.
pub fn file_version(bytes: &[u8]) -> Result<Version, IdentityError> {
    bytes
        .windows(VERSION_INFO_KEY.len())
        .enumerate()
        .filter(|(_, window)| *window == VERSION_INFO_KEY)
        .filter_map(|(key, _)| key.checked_sub(KEY_OFFSET))
        .find_map(|header| fixed_file_version(bytes, header))
        .ok_or(IdentityError::MissingVersionInfo)
}

fn fixed_file_version(bytes: &[u8], header: usize) -> Option<Version> {
    let value_len = read_u16_le(bytes, header + 2)?;
    if usize::from(value_len) < FIXED_INFO_LEN {
        return None;
    }

    let info = header + FIXED_INFO_OFFSET;
    let block = bytes.get(info..info + FIXED_INFO_LEN)?;
    if block[..FIXED_FILE_INFO_SIGNATURE.len()] != FIXED_FILE_INFO_SIGNATURE {
        return None;
    }
    // dwStrucVersion is 1.0 in every published layout.
    if read_u32_le(block, STRUC_VERSION_OFFSET)? >> 16 != 1 {
        return None;
    }

    let ms = read_u32_le(block, FILE_VERSION_MS_OFFSET)?;
    let ls = read_u32_le(block, FILE_VERSION_LS_OFFSET)?;
    Some(Version::new(
        u64::from(ms >> 16),
        u64::from(ms & 0xffff),
        u64::from(ls >> 16),
    ))
}

fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    bytes
        .get(offset..offset + 2)
        .and_then(|slice| <[u8; 2]>::try_from(slice).ok())
        .map(u16::from_le_bytes)
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|slice| <[u8; 4]>::try_from(slice).ok())
        .map(u32::from_le_bytes)
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for &b in digest.as_slice() {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
