use super::mutations::{Mutations, impl_mutations};
use crate::encoding::Charset;

/// A `<!DOCTYPE>` declaration.
pub struct Doctype<'r> {
    name: Option<String>,
    public_id: Option<String>,
    system_id: Option<String>,
    force_quirks: bool,
    raw: &'r [u8],
    mutations: Mutations,
}

impl<'r> Doctype<'r> {
    pub(crate) fn new(
        charset: Charset,
        name: Option<String>,
        public_id: Option<String>,
        system_id: Option<String>,
        force_quirks: bool,
        raw: &'r [u8],
    ) -> Self {
        Self {
            name: name.map(|name| name.to_ascii_lowercase()),
            public_id,
            system_id,
            force_quirks,
            raw,
            mutations: Mutations::new(charset),
        }
    }

    /// Lowercase doctype name, e.g. `html`.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn force_quirks(&self) -> bool {
        self.force_quirks
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        self.mutations.serialize(self.raw, out);
    }
}

impl_mutations!(Doctype);
