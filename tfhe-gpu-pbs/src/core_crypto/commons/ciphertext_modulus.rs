//! Module containing the definition of the [`CiphertextModulus`].

use core::num::NonZeroU128;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Private enum to avoid end user mis-instantiating a CiphertextModulus
///
/// NonZeroU128 allows to always have a correct modulus, the tag of the Native variant takes the
/// place of the 0 value.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CiphertextModulusInner {
    Native,
    Custom(NonZeroU128),
}

/// Structure representing the modulus $q$ of the 64 bits ciphertexts handled by this crate.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CiphertextModulus {
    inner: CiphertextModulusInner,
}

#[derive(Serialize, Deserialize)]
struct SerializableCiphertextModulus {
    modulus: u128,
}

impl Serialize for CiphertextModulus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let modulus = match self.inner {
            CiphertextModulusInner::Native => 0,
            CiphertextModulusInner::Custom(modulus) => modulus.get(),
        };
        SerializableCiphertextModulus { modulus }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CiphertextModulus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let thing = SerializableCiphertextModulus::deserialize(deserializer)?;
        Self::try_new(thing.modulus).map_err(serde::de::Error::custom)
    }
}

impl CiphertextModulus {
    /// The native modulus $2^{64}$, arithmetic is the wrapping arithmetic of `u64`.
    pub const fn new_native() -> Self {
        Self {
            inner: CiphertextModulusInner::Native,
        }
    }

    /// Build a modulus from its value, `0` and $2^{64}$ both mean native.
    pub fn try_new(modulus: u128) -> Result<Self, &'static str> {
        if modulus > 1u128 << 64 {
            return Err("Modulus is bigger than the maximum value of the associated Scalar type");
        }
        if modulus == 0 || modulus == 1u128 << 64 {
            return Ok(Self::new_native());
        }
        let modulus = NonZeroU128::new(modulus).ok_or("Modulus cannot be zero")?;
        Ok(Self {
            inner: CiphertextModulusInner::Custom(modulus),
        })
    }

    pub const fn is_native_modulus(&self) -> bool {
        matches!(self.inner, CiphertextModulusInner::Native)
    }

    pub fn get_custom_modulus(&self) -> u128 {
        match self.inner {
            CiphertextModulusInner::Native => 0,
            CiphertextModulusInner::Custom(modulus) => modulus.get(),
        }
    }
}

impl Debug for CiphertextModulus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.inner {
            CiphertextModulusInner::Native => write!(f, "CiphertextModulus(2^64)"),
            CiphertextModulusInner::Custom(modulus) => write!(f, "CiphertextModulus({modulus})"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn native_aliases() {
        assert!(CiphertextModulus::try_new(0).unwrap().is_native_modulus());
        assert!(CiphertextModulus::try_new(1 << 64).unwrap().is_native_modulus());
        let custom = CiphertextModulus::try_new(1 << 32).unwrap();
        assert!(!custom.is_native_modulus());
        assert_eq!(custom.get_custom_modulus(), 1 << 32);
        assert!(CiphertextModulus::try_new((1 << 64) + 1).is_err());
    }
}
