// Copyright 2025 Irreducible Inc.

//! Sequential stand-ins for the rayon iterator entry points. The returned values are ordinary
//! `std` iterators, whose `for_each`, `enumerate`, `map` and `sum` match the call shapes of
//! their rayon counterparts.

use std::ops::Range;

pub trait IntoParallelIterator {
	type Iter: Iterator<Item = Self::Item>;
	type Item;

	fn into_par_iter(self) -> Self::Iter;
}

impl IntoParallelIterator for Range<usize> {
	type Iter = Range<usize>;
	type Item = usize;

	#[inline(always)]
	fn into_par_iter(self) -> Self::Iter {
		self
	}
}

pub trait IntoParallelRefIterator<'data> {
	type Iter: Iterator<Item = Self::Item>;
	type Item: 'data;

	fn par_iter(&'data self) -> Self::Iter;
}

impl<'data, T: Sync + 'data> IntoParallelRefIterator<'data> for [T] {
	type Iter = std::slice::Iter<'data, T>;
	type Item = &'data T;

	#[inline(always)]
	fn par_iter(&'data self) -> Self::Iter {
		self.iter()
	}
}

pub trait IntoParallelRefMutIterator<'data> {
	type Iter: Iterator<Item = Self::Item>;
	type Item: 'data;

	fn par_iter_mut(&'data mut self) -> Self::Iter;
}

impl<'data, T: Send + 'data> IntoParallelRefMutIterator<'data> for [T] {
	type Iter = std::slice::IterMut<'data, T>;
	type Item = &'data mut T;

	#[inline(always)]
	fn par_iter_mut(&'data mut self) -> Self::Iter {
		self.iter_mut()
	}
}
