/// Pads its contents to a full cache line (two lines on Apple silicon,
/// which prefetches line pairs) so hotly-written neighbours never share
/// one.
#[repr(align(64))]
#[cfg_attr(all(target_arch = "aarch64", target_os = "macos"), repr(align(128)))]
pub(crate) struct CachePadded<T>(pub(crate) T);

impl<T> CachePadded<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(value)
    }
}
