use std::fmt;

use super::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumVariant {
    name: Box<str>,
    number: i32,
}

impl EnumVariant {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn number(&self) -> i32 {
        self.number
    }
}

/// An ordered set of named integer variants.
///
/// Variant `0` always exists, it's the value an absent optional field resolves to when the
/// schema doesn't give it an explicit default.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EnumDescriptor {
    name: Box<str>,
    variants: Box<[EnumVariant]>,
    catch_all: Option<i32>,
}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("EnumDescriptor");
        dbg.field("name", &self.name).field(
            "variants",
            &self
                .variants
                .iter()
                .map(|v| (v.name(), v.number))
                .collect::<Vec<_>>(),
        );

        if let Some(catch_all) = self.catch_all {
            dbg.field("catch_all", &catch_all);
        }

        dbg.finish()
    }
}

impl EnumDescriptor {
    pub fn new<N, I, S>(name: N, variants: I) -> Result<Self, SchemaError>
    where
        N: Into<Box<str>>,
        I: IntoIterator<Item = (S, i32)>,
        S: Into<Box<str>>,
    {
        let name = name.into();

        let variants = variants
            .into_iter()
            .map(|(variant_name, number)| EnumVariant {
                name: variant_name.into(),
                number,
            })
            .collect::<Box<[_]>>();

        for (idx, variant) in variants.iter().enumerate() {
            let duplicate = variants[..idx]
                .iter()
                .any(|prev| prev.number == variant.number || prev.name == variant.name);

            if duplicate {
                return Err(SchemaError::DuplicateVariant {
                    enum_name: name,
                    variant: variant.name.clone(),
                });
            }
        }

        if !variants.iter().any(|variant| variant.number == 0) {
            return Err(SchemaError::MissingZeroVariant { enum_name: name });
        }

        Ok(Self {
            name,
            variants,
            catch_all: None,
        })
    }

    /// Values not declared by this enum decode as the variant `number` instead of failing.
    pub fn with_catch_all(mut self, number: i32) -> Result<Self, SchemaError> {
        if self.variant(number).is_none() {
            return Err(SchemaError::InvalidCatchAll {
                enum_name: self.name,
                number,
            });
        }

        self.catch_all = Some(number);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variants in declaration order.
    pub fn variants(&self) -> &[EnumVariant] {
        &self.variants
    }

    pub fn variant(&self, number: i32) -> Option<&EnumVariant> {
        self.variants.iter().find(|variant| variant.number == number)
    }

    pub fn variant_by_name(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|variant| &*variant.name == name)
    }

    pub fn catch_all(&self) -> Option<&EnumVariant> {
        self.catch_all.and_then(|number| self.variant(number))
    }

    /// Maps a number read off the wire to the variant it decodes as.
    pub(crate) fn resolve_decoded(&self, number: i32) -> Option<i32> {
        match self.variant(number) {
            Some(variant) => Some(variant.number),
            None => self.catch_all,
        }
    }
}
