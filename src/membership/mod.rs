//! Static cluster membership.
//!
//! The membership descriptor is the single string every node receives at
//! bootstrap, `name1=peerURL1,name2=peerURL2,...`. Its entry order is the
//! allocation order of names and sockets, and the first entry is the
//! primary that orders writes.


use std::collections::HashSet;

use crate::majority_count;
use crate::Endpoint;
use crate::Error;
use crate::Result;

const ENTRY_SEPARATOR: char = ',';
const NAME_SEPARATOR: char = '=';

/// Renders `(name, peerAddress)` pairs into a membership descriptor.
///
/// Entries are emitted in input order, joined by `,`, with no trailing
/// separator. Nothing is deduplicated or syntax-checked here; that is the
/// job of [`ClusterMembership::parse`] during node validation.
pub fn build_descriptor<N, U>(entries: &[(N, U)]) -> String
where
    N: AsRef<str>,
    U: AsRef<str>,
{
    entries
        .iter()
        .map(|(name, url)| format!("{}{}{}", name.as_ref(), NAME_SEPARATOR, url.as_ref()))
        .collect::<Vec<_>>()
        .join(&ENTRY_SEPARATOR.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub name: String,
    pub peer_url: String,
}

impl MemberEntry {
    /// `host:port` to dial for peer traffic
    pub fn peer_address(&self) -> Result<String> {
        Ok(Endpoint::parse(&self.peer_url)?.host_port())
    }
}

/// Parsed, validated view of a membership descriptor
#[derive(Debug, Clone)]
pub struct ClusterMembership {
    members: Vec<MemberEntry>,
    descriptor: String,
}

impl ClusterMembership {
    /// Parses and validates a descriptor
    ///
    /// # Errors
    /// `Error::InvalidConfig` when the descriptor is empty, an entry lacks
    /// `=`, a name is empty or repeated, or a peer URL is malformed.
    pub fn parse(descriptor: &str) -> Result<Self> {
        if descriptor.trim().is_empty() {
            return Err(Error::InvalidConfig("membership descriptor is empty".into()));
        }

        let mut members = Vec::new();
        let mut names = HashSet::new();
        for raw in descriptor.split(ENTRY_SEPARATOR) {
            let (name, url) = raw.split_once(NAME_SEPARATOR).ok_or_else(|| {
                Error::InvalidConfig(format!("membership entry {raw:?} is not of the form name=url"))
            })?;

            if name.is_empty() {
                return Err(Error::InvalidConfig(format!("membership entry {raw:?} has an empty name")));
            }
            if !names.insert(name) {
                return Err(Error::InvalidConfig(format!("duplicate member name {name:?}")));
            }
            Endpoint::parse(url)?;

            members.push(MemberEntry {
                name: name.to_string(),
                peer_url: url.to_string(),
            });
        }

        Ok(Self {
            members,
            descriptor: descriptor.to_string(),
        })
    }

    /// The exact string this membership was parsed from
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn members(&self) -> &[MemberEntry] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(
        &self,
        name: &str,
    ) -> Option<&MemberEntry> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Position of `name` in the descriptor
    pub fn position(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    /// The member that orders writes: always the first entry
    pub fn primary(&self) -> &MemberEntry {
        &self.members[0]
    }

    pub fn is_primary(
        &self,
        name: &str,
    ) -> bool {
        self.primary().name == name
    }

    /// All members except `name`
    pub fn peers_of<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MemberEntry> + 'a {
        self.members.iter().filter(move |m| m.name != name)
    }

    /// Acknowledgements (self included) required to commit a write
    pub fn quorum(&self) -> usize {
        majority_count(self.members.len())
    }
}
