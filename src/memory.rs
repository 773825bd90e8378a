//! Scratch arena allocation.

/// A buffer backed by an anonymous huge-page mapping.
#[cfg(all(feature = "huge-page", target_os = "linux"))]
pub struct HugeSlice<T> {
    ptr: *mut T,
    len: usize,
    capacity: usize,
}

#[cfg(all(feature = "huge-page", target_os = "linux"))]
unsafe impl<T: Send> Send for HugeSlice<T> {}

#[cfg(all(feature = "huge-page", target_os = "linux"))]
unsafe impl<T: Sync> Sync for HugeSlice<T> {}

#[cfg(all(feature = "huge-page", target_os = "linux"))]
impl<T> HugeSlice<T> {
    /// Map `len` elements of anonymous huge-page memory.
    pub fn new(len: usize) -> Result<Self, std::io::Error> {
        const HUGE_PAGE_SIZE: usize = 2 << 20;

        if core::mem::align_of::<T>() > HUGE_PAGE_SIZE {
            return Err(std::io::Error::other(
                "alignment of the type is greater than the huge page size",
            ));
        }

        let size = core::mem::size_of::<T>()
            .checked_mul(len)
            .and_then(|s| s.checked_next_multiple_of(HUGE_PAGE_SIZE))
            .ok_or_else(|| std::io::Error::other("allocation size overflow"))?;

        if size == 0 {
            return Err(std::io::Error::other("allocation size must be non-zero"));
        }

        let ptr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_HUGETLB | libc::MAP_POPULATE,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(std::io::Error::last_os_error());
        }

        Ok(Self {
            ptr: ptr.cast::<T>(),
            len,
            capacity: size,
        })
    }
}

#[cfg(all(feature = "huge-page", target_os = "linux"))]
impl<T> core::ops::Deref for HugeSlice<T> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        unsafe { core::slice::from_raw_parts(self.ptr, self.len) }
    }
}

#[cfg(all(feature = "huge-page", target_os = "linux"))]
impl<T> core::ops::DerefMut for HugeSlice<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { core::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

#[cfg(all(feature = "huge-page", target_os = "linux"))]
impl<T> Drop for HugeSlice<T> {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.cast::<libc::c_void>(), self.capacity);
        }
    }
}

/// A scratch buffer that can be backed by a huge page or a normal heap slice.
pub enum MaybeHugeSlice<T> {
    /// An anonymous huge-page mapping.
    #[cfg(all(feature = "huge-page", target_os = "linux"))]
    Huge(HugeSlice<T>),
    /// A plain heap slice.
    Normal(Box<[T]>),
}

impl<T> MaybeHugeSlice<T> {
    /// Allocate a heap slice without eager initialization.
    ///
    /// Every user in this crate writes the buffer before first read.
    pub fn new_slice(len: usize) -> Self {
        let mut b = Vec::<T>::with_capacity(len);
        unsafe {
            b.set_len(len);
        }
        MaybeHugeSlice::Normal(b.into_boxed_slice())
    }

    /// Allocate, preferring a huge-page mapping when the feature and platform
    /// allow, falling back to the heap.
    pub fn new(len: usize) -> Self {
        #[cfg(all(feature = "huge-page", target_os = "linux"))]
        if let Ok(huge) = HugeSlice::new(len) {
            return MaybeHugeSlice::Huge(huge);
        }

        Self::new_slice(len)
    }

    /// Check if the buffer is backed by a huge page.
    pub fn is_huge_page(&self) -> bool {
        match self {
            #[cfg(all(feature = "huge-page", target_os = "linux"))]
            MaybeHugeSlice::Huge(_) => true,
            MaybeHugeSlice::Normal(_) => false,
        }
    }
}

impl<T> AsRef<[T]> for MaybeHugeSlice<T> {
    fn as_ref(&self) -> &[T] {
        match self {
            #[cfg(all(feature = "huge-page", target_os = "linux"))]
            MaybeHugeSlice::Huge(b) => b,
            MaybeHugeSlice::Normal(b) => b,
        }
    }
}

impl<T> AsMut<[T]> for MaybeHugeSlice<T> {
    fn as_mut(&mut self) -> &mut [T] {
        match self {
            #[cfg(all(feature = "huge-page", target_os = "linux"))]
            MaybeHugeSlice::Huge(b) => b,
            MaybeHugeSlice::Normal(b) => b,
        }
    }
}

impl<T> core::ops::Deref for MaybeHugeSlice<T> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

impl<T> core::ops::DerefMut for MaybeHugeSlice<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut()
    }
}
