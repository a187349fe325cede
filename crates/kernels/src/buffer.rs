// Copyright 2024-2025 Irreducible Inc.

use std::{
	alloc::{self, Layout},
	fmt,
	marker::PhantomData,
	ops::{Deref, DerefMut},
	ptr::NonNull,
};

use bytemuck::Pod;

use crate::error::Error;

/// Alignment of every [`AlignedBuffer`], one cache line. It covers the 32-byte alignment the
/// aligned 256-bit loads and stores require.
pub const BUFFER_ALIGNMENT: usize = 64;

/// A heap buffer of `Pod` elements whose first element sits on a [`BUFFER_ALIGNMENT`] boundary.
///
/// The buffer is owned by whoever allocated it. Kernels only borrow it for the duration of a
/// call and mutate it in place.
pub struct AlignedBuffer<T: Pod> {
	ptr: NonNull<T>,
	len: usize,
	layout: Layout,
	_marker: PhantomData<T>,
}

// SAFETY: the buffer uniquely owns its allocation, like `Vec<T>`.
unsafe impl<T: Pod + Send> Send for AlignedBuffer<T> {}
// SAFETY: shared access only hands out `&[T]`.
unsafe impl<T: Pod + Sync> Sync for AlignedBuffer<T> {}

impl<T: Pod> AlignedBuffer<T> {
	/// Allocates `len` zero-initialised elements.
	pub fn zeroed(len: usize) -> Result<Self, Error> {
		let size = len
			.checked_mul(std::mem::size_of::<T>())
			.ok_or(Error::AllocationTooLarge { len })?;
		// Never request a zero-sized allocation; an empty buffer still owns one cache line.
		let layout = Layout::from_size_align(size.max(BUFFER_ALIGNMENT), BUFFER_ALIGNMENT)
			.map_err(|_| Error::AllocationTooLarge { len })?;

		// SAFETY: `layout` has a non-zero size.
		let raw = unsafe { alloc::alloc_zeroed(layout) };
		let Some(ptr) = NonNull::new(raw.cast::<T>()) else {
			alloc::handle_alloc_error(layout);
		};

		Ok(Self {
			ptr,
			len,
			layout,
			_marker: PhantomData,
		})
	}

	pub fn from_slice(values: &[T]) -> Result<Self, Error> {
		let mut buffer = Self::zeroed(values.len())?;
		buffer.copy_from_slice(values);
		Ok(buffer)
	}

	pub fn as_slice(&self) -> &[T] {
		// SAFETY: `ptr` points to `len` initialised elements owned by `self`; all-zero bytes are
		// a valid `T` because `T: Pod`.
		unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
	}

	pub fn as_mut_slice(&mut self) -> &mut [T] {
		// SAFETY: as in `as_slice`, and `&mut self` guarantees exclusive access.
		unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
	}
}

impl<T: Pod> Drop for AlignedBuffer<T> {
	fn drop(&mut self) {
		// SAFETY: allocated in `zeroed` with exactly this layout.
		unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) }
	}
}

impl<T: Pod> Deref for AlignedBuffer<T> {
	type Target = [T];

	fn deref(&self) -> &[T] {
		self.as_slice()
	}
}

impl<T: Pod> DerefMut for AlignedBuffer<T> {
	fn deref_mut(&mut self) -> &mut [T] {
		self.as_mut_slice()
	}
}

impl<T: Pod> Clone for AlignedBuffer<T> {
	fn clone(&self) -> Self {
		// SAFETY: `self.layout` was accepted by the allocator before, so it is non-zero sized.
		let raw = unsafe { alloc::alloc(self.layout) };
		let Some(ptr) = NonNull::new(raw.cast::<T>()) else {
			alloc::handle_alloc_error(self.layout);
		};
		// SAFETY: both regions are `layout.size()` bytes long and do not overlap.
		unsafe {
			std::ptr::copy_nonoverlapping(
				self.ptr.as_ptr().cast::<u8>(),
				ptr.as_ptr().cast::<u8>(),
				self.layout.size(),
			)
		};

		Self {
			ptr,
			len: self.len,
			layout: self.layout,
			_marker: PhantomData,
		}
	}
}

impl<T: Pod + fmt::Debug> fmt::Debug for AlignedBuffer<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AlignedBuffer")
			.field("len", &self.len)
			.field("align", &self.layout.align())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_alignment_and_zeroing() {
		for len in [0, 1, 7, 8, 1000, 1 << 16] {
			let buffer = AlignedBuffer::<i32>::zeroed(len).unwrap();
			assert_eq!(buffer.len(), len);
			assert_eq!(buffer.as_ptr() as usize % BUFFER_ALIGNMENT, 0);
			assert!(buffer.iter().all(|&x| x == 0));
		}
	}

	#[test]
	fn test_from_slice_and_clone() {
		let values = [1.5f64, -2.0, 0.0, f64::MAX];
		let buffer = AlignedBuffer::from_slice(&values).unwrap();
		let copy = buffer.clone();
		assert_eq!(&*copy, &values);
		assert_ne!(copy.as_ptr(), buffer.as_ptr());
		assert_eq!(copy.as_ptr() as usize % BUFFER_ALIGNMENT, 0);
	}

	#[test]
	fn test_overflowing_length_is_rejected() {
		assert!(AlignedBuffer::<u64>::zeroed(usize::MAX).is_err());
	}
}
