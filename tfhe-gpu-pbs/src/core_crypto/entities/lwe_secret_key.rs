//! Module containing the definition of the LweSecretKey.

use crate::core_crypto::commons::parameters::*;
use crate::core_crypto::commons::traits::*;

/// An [`LWE secret key`](`LweSecretKey`), binary in this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LweSecretKey<C: Container> {
    data: C,
}

impl<C: Container> AsRef<[u64]> for LweSecretKey<C> {
    fn as_ref(&self) -> &[u64] {
        self.data.as_ref()
    }
}

impl<C: ContainerMut> AsMut<[u64]> for LweSecretKey<C> {
    fn as_mut(&mut self) -> &mut [u64] {
        self.data.as_mut()
    }
}

impl<C: Container> LweSecretKey<C> {
    /// # Panics
    ///
    /// Panics if the container is empty.
    pub fn from_container(container: C) -> Self {
        assert!(
            container.container_len() > 0,
            "Got an empty container to create an LweSecretKey"
        );
        Self { data: container }
    }

    pub fn lwe_dimension(&self) -> LweDimension {
        LweDimension(self.data.container_len())
    }

    pub fn into_container(self) -> C {
        self.data
    }
}

pub type LweSecretKeyOwned = LweSecretKey<Vec<u64>>;
pub type LweSecretKeyView<'data> = LweSecretKey<&'data [u64]>;

impl LweSecretKeyOwned {
    pub fn new_empty_key(value: u64, lwe_dimension: LweDimension) -> Self {
        Self::from_container(vec![value; lwe_dimension.0])
    }
}
