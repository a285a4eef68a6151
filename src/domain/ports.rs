/// Class bytes source port (implemented by the classpath adapter)
pub trait ClassSource: Send + Sync {
    /// Raw class-file bytes for a binary internal name (`a/b/C`), or `None`
    /// when no entry provides it.
    fn resolve(&self, name: &str) -> Option<Vec<u8>>;

    /// Every class name this source can resolve, sorted and deduplicated.
    fn class_names(&self) -> Vec<String>;
}

/// A source consulted in order: the first hit wins.
pub struct ChainedSource<'a> {
    sources: Vec<&'a dyn ClassSource>,
}

impl<'a> ChainedSource<'a> {
    pub fn new(sources: Vec<&'a dyn ClassSource>) -> Self {
        Self { sources }
    }
}

impl ClassSource for ChainedSource<'_> {
    fn resolve(&self, name: &str) -> Option<Vec<u8>> {
        self.sources.iter().find_map(|s| s.resolve(name))
    }

    fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.iter().flat_map(|s| s.class_names()).collect();
        names.sort();
        names.dedup();
        names
    }
}
