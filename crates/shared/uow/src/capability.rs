//! Repository capabilities.

use std::fmt;

/// A single data-access operation a repository may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Create,
    Retrieve,
    Update,
    Delete,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Create,
        Capability::Retrieve,
        Capability::Update,
        Capability::Delete,
    ];

    const fn bit(self) -> u8 {
        match self {
            Capability::Create => 0b0001,
            Capability::Retrieve => 0b0010,
            Capability::Update => 0b0100,
            Capability::Delete => 0b1000,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Create => "create",
            Capability::Retrieve => "retrieve",
            Capability::Update => "update",
            Capability::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The set of capabilities a repository declares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const CRUD: Capabilities = Capabilities(0b1111);
    pub const READ_ONLY: Capabilities = Capabilities(0b0010);

    pub fn of(capabilities: &[Capability]) -> Self {
        capabilities
            .iter()
            .fold(Self::NONE, |set, cap| set.with(*cap))
    }

    pub const fn with(self, capability: Capability) -> Self {
        Capabilities(self.0 | capability.bit())
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |cap| self.contains(*cap))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_membership() {
        let caps = Capabilities::of(&[Capability::Create, Capability::Retrieve]);
        assert!(caps.contains(Capability::Create));
        assert!(caps.contains(Capability::Retrieve));
        assert!(!caps.contains(Capability::Update));
        assert!(!caps.contains(Capability::Delete));
    }

    #[test]
    fn test_crud_contains_everything() {
        assert!(Capability::ALL
            .iter()
            .all(|cap| Capabilities::CRUD.contains(*cap)));
        assert_eq!(Capabilities::of(&Capability::ALL), Capabilities::CRUD);
    }

    #[test]
    fn test_iter_keeps_declaration_order() {
        let caps = Capabilities::NONE
            .with(Capability::Delete)
            .with(Capability::Create);
        let listed: Vec<_> = caps.iter().collect();
        assert_eq!(listed, vec![Capability::Create, Capability::Delete]);
    }
}
