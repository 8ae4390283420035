//! Host image snapshot and the "what is missing" decision.
//!
//! The snapshot is taken once per provisioning call and treated as
//! immutable input.

use std::collections::HashSet;

/// Images present on the host, as `repository` and `repository:tag` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostImages {
    repositories: HashSet<String>,
    references: HashSet<String>,
}

impl HostImages {
    /// Parse the output of `docker image ls --format '{{.Repository}}:{{.Tag}}'`.
    ///
    /// Dangling images (`<none>`) are ignored.
    #[must_use]
    pub fn parse(listing: &str) -> Self {
        let mut images = Self::default();
        for line in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (repo, tag) = split_reference(line);
            if repo == "<none>" {
                continue;
            }
            images.repositories.insert(repo.to_string());
            if let Some(tag) = tag.filter(|t| *t != "<none>") {
                images.references.insert(format!("{repo}:{tag}"));
            }
        }
        images
    }

    /// Whether `image` is present. An untagged identifier matches any tag of
    /// its repository; a tagged one must match exactly.
    #[must_use]
    pub fn contains(&self, image: &str) -> bool {
        match split_reference(image) {
            (repo, None) => self.repositories.contains(repo),
            (repo, Some(tag)) => self.references.contains(&format!("{repo}:{tag}")),
        }
    }

    /// Number of distinct repositories in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

/// Split `repo[:tag]`, keeping registry ports (`host:5000/repo`) in the repo.
fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.rfind(':') {
        Some(idx) if !reference[idx + 1..].contains('/') => {
            (&reference[..idx], Some(&reference[idx + 1..]))
        }
        _ => (reference, None),
    }
}

/// Required images absent from `host`, in the order they were required.
#[must_use]
pub fn missing_images<'a>(required: &'a [String], host: &HostImages) -> Vec<&'a str> {
    required
        .iter()
        .map(String::as_str)
        .filter(|image| !host.contains(image))
        .collect()
}
