//! Container traits the entities are generic over.
//!
//! Entities wrap a container of 64 bits words: an owned `Vec<u64>`, or a borrowed slice when the
//! entity is a view into a larger one.

/// A type that can be viewed as a slice of torus elements.
pub trait Container: AsRef<[u64]> {
    fn container_len(&self) -> usize {
        self.as_ref().len()
    }
}

impl<T: AsRef<[u64]> + ?Sized> Container for T {}

/// A mutable [`Container`].
pub trait ContainerMut: Container + AsMut<[u64]> {}

impl<T: AsRef<[u64]> + AsMut<[u64]> + ?Sized> ContainerMut for T {}
