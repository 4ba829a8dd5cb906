//! Platform detection and target-tuple representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system component of a target tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Windows,
    Macos,
    Linux,
    FreeBsd,
    Other(String),
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Os::Windows => "windows",
            Os::Macos => "macos",
            Os::Linux => "linux",
            Os::FreeBsd => "freebsd",
            Os::Other(s) => s,
        };
        write!(f, "{s}")
    }
}

/// CPU architecture component of a target tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    X86,
    Aarch64,
    Arm,
    Other(String),
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Arch::X86_64 => "x86_64",
            Arch::X86 => "x86",
            Arch::Aarch64 => "aarch64",
            Arch::Arm => "arm",
            Arch::Other(s) => s,
        };
        write!(f, "{s}")
    }
}

/// The linux libc flavor, relevant only when `os == Linux`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Libc {
    Gnu,
    Musl,
}

impl fmt::Display for Libc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Libc::Gnu => write!(f, "gnu"),
            Libc::Musl => write!(f, "musl"),
        }
    }
}

/// Target platform a plan is generated for: `{os, arch, linux_family?, libc?}`
/// as spec.md §3 defines `InstallationPlan.platform`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
    /// Present only on Linux; distinguishes e.g. "debian"/"alpine" families
    /// used by when-clauses that key off a distro family rather than libc.
    pub linux_family: Option<String>,
    pub libc: Option<Libc>,
}

impl Platform {
    /// Detect the platform the current process is running on.
    pub fn current() -> Self {
        let os = Self::current_os();
        let is_linux = matches!(os, Os::Linux);
        let libc = is_linux.then(Self::current_libc);
        let linux_family = is_linux.then(Self::current_linux_family);
        Self {
            os,
            arch: Self::current_arch(),
            linux_family,
            libc,
        }
    }

    fn current_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::Macos
        } else if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "freebsd") {
            Os::FreeBsd
        } else {
            Os::Other(std::env::consts::OS.to_string())
        }
    }

    fn current_arch() -> Arch {
        if cfg!(target_arch = "x86_64") {
            Arch::X86_64
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else if cfg!(target_arch = "aarch64") {
            Arch::Aarch64
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else {
            Arch::Other(std::env::consts::ARCH.to_string())
        }
    }

    #[cfg(target_os = "linux")]
    fn current_libc() -> Libc {
        if cfg!(target_env = "musl") {
            Libc::Musl
        } else {
            Libc::Gnu
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn current_libc() -> Libc {
        Libc::Gnu
    }

    fn current_linux_family() -> String {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|contents| {
                contents.lines().find_map(|line| {
                    line.strip_prefix("ID_LIKE=")
                        .or_else(|| line.strip_prefix("ID="))
                        .map(|v| v.trim_matches('"').to_string())
                })
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Short directory-name form, e.g. `"linux-x86_64"`.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_has_known_os_and_arch() {
        let p = Platform::current();
        assert!(!p.dir_name().is_empty());
    }

    #[test]
    fn dir_name_joins_os_and_arch() {
        let p = Platform {
            os: Os::Linux,
            arch: Arch::X86_64,
            linux_family: Some("debian".into()),
            libc: Some(Libc::Gnu),
        };
        assert_eq!(p.dir_name(), "linux-x86_64");
    }
}
