use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::algorithms::JwtAlgorithm;
use crate::error::*;

/// Finds the algorithm of a token, either from its `alg` name or directly
/// from its base64url header segment.
#[derive(Clone)]
pub struct JwtAlgorithmResolver {
    by_name: HashMap<Box<[u8]>, Arc<dyn JwtAlgorithm>>,
    by_header: HashMap<Box<[u8]>, Arc<dyn JwtAlgorithm>>,
}

impl fmt::Debug for JwtAlgorithmResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self
            .by_name
            .values()
            .map(|algorithm| algorithm.alg_name())
            .collect();
        names.sort_unstable();
        f.debug_struct("JwtAlgorithmResolver")
            .field("algorithms", &names)
            .finish()
    }
}

impl JwtAlgorithmResolver {
    /// Fails if two algorithms share a name.
    pub fn new(algorithms: Vec<Arc<dyn JwtAlgorithm>>) -> Result<Self, Error> {
        let mut by_name = HashMap::with_capacity(algorithms.len());
        let mut by_header = HashMap::with_capacity(algorithms.len());
        for algorithm in algorithms {
            let name = algorithm.alg_name();
            if by_name.contains_key(name.as_bytes()) {
                bail!(JWTError::DuplicateAlgorithm(name.to_string()));
            }
            by_header.insert(
                Box::from(algorithm.header_base64url()),
                Arc::clone(&algorithm),
            );
            by_name.insert(Box::from(name.as_bytes()), algorithm);
        }
        Ok(JwtAlgorithmResolver { by_name, by_header })
    }

    pub fn resolve(&self, alg_name: &[u8]) -> Option<&Arc<dyn JwtAlgorithm>> {
        self.by_name.get(alg_name)
    }

    /// Matches a raw header segment against the canonical header of every
    /// registered algorithm.
    pub fn resolve_from_header_fragment(
        &self,
        header_base64url: &[u8],
    ) -> Option<&Arc<dyn JwtAlgorithm>> {
        self.by_header.get(header_base64url)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &Arc<dyn JwtAlgorithm>> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{HS256Algorithm, HS384Algorithm};

    fn algorithms() -> Vec<Arc<dyn JwtAlgorithm>> {
        vec![
            Arc::new(HS256Algorithm::new(b"key").unwrap()),
            Arc::new(HS384Algorithm::new(b"key").unwrap()),
        ]
    }

    #[test]
    fn resolve_by_name_and_header() {
        let resolver = JwtAlgorithmResolver::new(algorithms()).unwrap();
        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.resolve(b"HS384").unwrap().alg_name(), "HS384");
        assert!(resolver.resolve(b"hs384").is_none());
        assert!(resolver.resolve(b"RS256").is_none());
        let found = resolver
            .resolve_from_header_fragment(b"eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9")
            .unwrap();
        assert_eq!(found.alg_name(), "HS256");
        assert!(resolver
            .resolve_from_header_fragment(b"eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ")
            .is_none());
        assert!(format!("{:?}", resolver).contains(r#"["HS256", "HS384"]"#));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut list = algorithms();
        list.push(Arc::new(HS256Algorithm::new(b"other key").unwrap()));
        let err = JwtAlgorithmResolver::new(list).unwrap_err();
        match err.downcast_ref::<JWTError>() {
            Some(JWTError::DuplicateAlgorithm(name)) => assert_eq!(name, "HS256"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn empty_resolver() {
        let resolver = JwtAlgorithmResolver::new(vec![]).unwrap();
        assert!(resolver.is_empty());
        assert!(resolver.resolve(b"HS256").is_none());
    }
}
