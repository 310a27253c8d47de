//! Import block model
//!
//! Imports are kept as groups (runs of specs separated by blank lines in the
//! source). Each group is sorted by path on normalization, the same way
//! `gofmt` sorts contiguous import lines.

/// One import spec: `[name] "path" [// comment]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Local name (`_`, `.`, or an alias)
    pub name: Option<String>,
    /// Unquoted import path
    pub path: String,
    /// Trailing same-line comment
    pub comment: Option<String>,
    /// Comment lines directly above the spec
    pub doc: Vec<String>,
}

impl ImportSpec {
    /// Plain import of `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: None,
            path: path.into(),
            comment: None,
            doc: Vec::new(),
        }
    }
}

/// All imports of a file, merged into one declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBlock {
    groups: Vec<Vec<ImportSpec>>,
    parenthesized: bool,
    /// Comment lines directly above the `import` keyword
    pub doc: Vec<String>,
}

impl ImportBlock {
    /// Empty block
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_groups(groups: Vec<Vec<ImportSpec>>, parenthesized: bool) -> Self {
        let mut block = Self {
            groups,
            parenthesized,
            doc: Vec::new(),
        };
        block.groups.retain(|g| !g.is_empty());
        block
    }

    /// Import groups in source order
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[Vec<ImportSpec>] {
        &self.groups
    }

    /// Total number of specs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// No imports at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the declaration renders as `import ( ... )`
    #[inline]
    #[must_use]
    pub fn is_parenthesized(&self) -> bool {
        self.parenthesized || self.len() > 1
    }

    /// Iterate over every import path
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(|s| s.path.as_str())
    }

    /// Check whether `path` is imported
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths().any(|p| p == path)
    }

    /// Add an unnamed import of `path`
    ///
    /// Returns `false` when the path is already imported. The spec lands in
    /// the group whose paths share the longest segment prefix with `path`;
    /// standard-library paths prefer the first group holding standard-library
    /// imports, other paths the last group holding third-party imports. With
    /// no such group, a new one is opened before (standard library) or after
    /// the existing groups.
    pub fn add(&mut self, path: &str) -> bool {
        if self.contains(path) {
            return false;
        }
        let spec = ImportSpec::new(path);
        match self.best_group(path) {
            Placement::Join(index) => {
                self.groups[index].push(spec);
                sort_group(&mut self.groups[index]);
            }
            Placement::First => self.groups.insert(0, vec![spec]),
            Placement::Last => self.groups.push(vec![spec]),
        }
        true
    }

    /// Sort every group by path and drop duplicate specs
    pub fn normalize(&mut self) {
        let mut seen: Vec<(Option<String>, String)> = Vec::new();
        for group in &mut self.groups {
            group.retain(|spec| {
                let key = (spec.name.clone(), spec.path.clone());
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            });
            sort_group(group);
        }
        self.groups.retain(|g| !g.is_empty());
    }

    fn best_group(&self, path: &str) -> Placement {
        let mut best: Option<(usize, usize)> = None;
        for (index, group) in self.groups.iter().enumerate() {
            let score = group
                .iter()
                .map(|spec| shared_segments(&spec.path, path))
                .max()
                .unwrap_or(0);
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((index, score));
            }
        }
        if let Some((index, _)) = best {
            return Placement::Join(index);
        }
        let std_like = is_std_path(path);
        let matching =
            |group: &Vec<ImportSpec>| group.iter().any(|s| is_std_path(&s.path) == std_like);
        let found = if std_like {
            self.groups.iter().position(matching)
        } else {
            self.groups.iter().rposition(matching)
        };
        match found {
            Some(index) => Placement::Join(index),
            None if std_like => Placement::First,
            None => Placement::Last,
        }
    }
}

/// Where [`ImportBlock::add`] puts a new spec
enum Placement {
    Join(usize),
    First,
    Last,
}

/// Standard-library paths have no dot in their first segment
#[inline]
#[must_use]
pub fn is_std_path(path: &str) -> bool {
    !path.split('/').next().unwrap_or("").contains('.')
}

fn shared_segments(a: &str, b: &str) -> usize {
    a.split('/')
        .zip(b.split('/'))
        .take_while(|(x, y)| x == y)
        .count()
}

fn sort_group(group: &mut [ImportSpec]) {
    group.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.name.cmp(&b.name)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(groups: &[&[&str]]) -> ImportBlock {
        ImportBlock::from_groups(
            groups
                .iter()
                .map(|g| g.iter().map(|p| ImportSpec::new(*p)).collect())
                .collect(),
            true,
        )
    }

    fn group_paths(block: &ImportBlock) -> Vec<Vec<&str>> {
        block
            .groups()
            .iter()
            .map(|g| g.iter().map(|s| s.path.as_str()).collect())
            .collect()
    }

    #[test]
    fn add_to_empty_creates_group() {
        let mut imports = ImportBlock::new();
        assert!(imports.add("github.com/spf13/viper"));
        assert_eq!(imports.len(), 1);
        assert!(!imports.is_parenthesized());
    }

    #[test]
    fn add_is_noop_when_present() {
        let mut imports = block(&[&["fmt"]]);
        assert!(!imports.add("fmt"));
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn std_import_joins_std_group_sorted() {
        let mut imports = block(&[&["fmt", "net/http"], &["github.com/gin-gonic/gin"]]);
        imports.add("log");
        assert_eq!(
            group_paths(&imports),
            vec![vec!["fmt", "log", "net/http"], vec!["github.com/gin-gonic/gin"]]
        );
    }

    #[test]
    fn module_path_joins_first_group() {
        let mut imports = block(&[&["fmt", "log"], &["github.com/gin-gonic/gin"]]);
        imports.add("myapp/pkg/infra/config");
        assert_eq!(group_paths(&imports)[0], vec!["fmt", "log", "myapp/pkg/infra/config"]);
    }

    #[test]
    fn shared_prefix_wins() {
        let mut imports = block(&[&["fmt"], &["github.com/spf13/viper"]]);
        imports.add("github.com/spf13/cobra");
        assert_eq!(
            group_paths(&imports)[1],
            vec!["github.com/spf13/cobra", "github.com/spf13/viper"]
        );
    }

    #[test]
    fn std_import_opens_leading_group() {
        let mut imports = block(&[&["github.com/spf13/viper"]]);
        imports.add("time");
        assert_eq!(
            group_paths(&imports),
            vec![vec!["time"], vec!["github.com/spf13/viper"]]
        );
    }

    #[test]
    fn normalize_sorts_and_dedupes() {
        let mut imports = block(&[&["os", "fmt", "os"], &["fmt"]]);
        imports.normalize();
        assert_eq!(group_paths(&imports), vec![vec!["fmt", "os"]]);
    }

    #[test]
    fn std_path_detection() {
        assert!(is_std_path("net/http"));
        assert!(is_std_path("myapp/pkg/infra/config"));
        assert!(!is_std_path("github.com/spf13/viper"));
    }
}
