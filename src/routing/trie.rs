use std::collections::HashMap;

use crate::error::RouterError;
use crate::routing::params::Params;

/// A node in the compressed radix trie. Static nodes store a literal byte
/// fragment of the path (a segment, a `/`, or a shared prefix produced by a
/// split); wildcard nodes store the parameter name without the leading `:`.
///
/// The root is a static node with an empty fragment. Both insertion and
/// lookup operate on canonical paths: leading `/` stripped, trailing `/`
/// stripped unless the path is `/` itself.
pub(crate) struct Node<T> {
    /// Literal fragment for static nodes, parameter name for wildcard nodes.
    pub(crate) path: String,

    /// Number of registered route paths terminating in this subtree. Orders
    /// sibling static children so busy branches are scanned first.
    pub(crate) priority: u32,

    /// First byte of each static child's fragment, kept in lockstep with
    /// `static_children` and sorted by descending child priority.
    pub(crate) indices: Vec<u8>,

    pub(crate) static_children: Vec<Node<T>>,

    /// At most one wildcard child per node; reached only when no static
    /// child matches.
    pub(crate) wildcard_child: Option<Box<Node<T>>>,

    pub(crate) is_wildcard: bool,

    /// Method -> handler table. Non-empty exactly on nodes where a
    /// registered route terminates.
    pub(crate) handlers: HashMap<String, T>,
}

/// Outcome of the read-only pre-walk over a route pattern.
enum Probe {
    /// The pattern already terminates at an existing node with handlers.
    Existing,
    /// The pattern adds a new route (possibly through existing nodes).
    New,
}

impl<T> Node<T> {
    pub(crate) fn new_root() -> Self {
        Node::new_static("")
    }

    fn new_static(path: &str) -> Self {
        Node {
            path: path.to_string(),
            priority: 0,
            indices: Vec::new(),
            static_children: Vec::new(),
            wildcard_child: None,
            is_wildcard: false,
            handlers: HashMap::new(),
        }
    }

    fn new_wildcard(name: &str) -> Self {
        Node {
            is_wildcard: true,
            ..Node::new_static(name)
        }
    }

    pub(crate) fn set_handler(&mut self, method: &str, handler: T) {
        self.handlers.insert(method.to_string(), handler);
    }

    /// Insert a canonical route pattern, returning the terminal node so the
    /// caller can attach a handler to it.
    ///
    /// Each node along the way counts one more route passing through it.
    /// Registering a pattern that already terminates at a node with handlers
    /// (a second method on the same path) returns that node without touching
    /// any priority.
    pub(crate) fn add_path(&mut self, path: &str) -> Result<&mut Node<T>, RouterError> {
        validate_pattern(path)?;

        match self.probe(path)? {
            Probe::Existing => Ok(self
                .terminal_mut(path)
                .expect("probe found an existing terminal")),
            Probe::New => {
                self.priority += 1;
                Ok(self.insert(path))
            }
        }
    }

    /// Look up a canonical request path. Returns the matched node (which may
    /// be an interior node with no handlers) and the parameters captured on
    /// the way. A trailing `/` left in the input is forgiven.
    pub(crate) fn find<'n>(&'n self, path: &str) -> (Option<&'n Node<T>>, Params) {
        let mut params = Params::new();
        let mut node = self;
        let mut path = path;

        loop {
            // Static fragments are consumed from the input; a wildcard
            // node's fragment is its parameter name and never appears there.
            if !node.is_wildcard {
                match path.strip_prefix(node.path.as_str()) {
                    Some(rest) => path = rest,
                    None => return (None, params),
                }
            }

            if path.is_empty() || path == "/" {
                return (Some(node), params);
            }

            // Statics win over a wildcard sibling.
            let first = path.as_bytes()[0];
            if let Some(i) = node.indices.iter().position(|&b| b == first) {
                node = &node.static_children[i];
                continue;
            }

            let wildcard = match node.wildcard_child.as_deref() {
                Some(w) => w,
                None => return (None, params),
            };

            let next_slash = path.find('/').unwrap_or(path.len());
            if next_slash == 0 {
                // Empty capture: `//` in the request path.
                return (None, params);
            }
            let (value, rest) = path.split_at(next_slash);
            params.push(&wildcard.path, value);

            if rest.is_empty() || rest == "/" {
                return (Some(wildcard), params);
            }

            // Something follows the parameter; it must continue in the
            // wildcard node's static children.
            match wildcard.indices.iter().position(|&b| b == rest.as_bytes()[0]) {
                Some(i) => {
                    path = rest;
                    node = &wildcard.static_children[i];
                }
                None => return (None, params),
            }
        }
    }

    /// Read-only walk mirroring `insert`: detects an existing terminal and
    /// rejects wildcard conflicts before anything is mutated, so a failed
    /// registration leaves the trie untouched.
    fn probe(&self, path: &str) -> Result<Probe, RouterError> {
        let mut node = self;
        let mut path = path;

        loop {
            if path.is_empty() {
                return Ok(if node.handlers.is_empty() {
                    Probe::New
                } else {
                    Probe::Existing
                });
            }

            let (token, rest) = next_token(path);

            if let Some(name) = token.strip_prefix(':') {
                if node.is_wildcard {
                    return Err(RouterError::NestedWildcard(path.to_string()));
                }
                match node.wildcard_child.as_deref() {
                    Some(w) if w.path == name => {
                        node = w;
                        path = rest;
                    }
                    Some(w) => {
                        return Err(RouterError::WildcardConflict {
                            existing: w.path.clone(),
                            conflicting: name.to_string(),
                        })
                    }
                    None => return Ok(Probe::New),
                }
                continue;
            }

            match node.find_common_child(token) {
                Some((i, common)) if common == node.static_children[i].path.len() => {
                    node = &node.static_children[i];
                    path = &path[common..];
                }
                // Divergence: everything deeper is freshly created, so no
                // further conflict is possible.
                _ => return Ok(Probe::New),
            }
        }
    }

    /// Mutable walk to an existing terminal. Only called after `probe`
    /// reported `Existing`.
    fn terminal_mut(&mut self, path: &str) -> Option<&mut Node<T>> {
        let mut node = self;
        let mut path = path;

        loop {
            if path.is_empty() {
                return Some(node);
            }

            let (token, rest) = next_token(path);

            if let Some(name) = token.strip_prefix(':') {
                match node.wildcard_child.as_deref_mut() {
                    Some(w) if w.path == name => {
                        node = w;
                        path = rest;
                    }
                    _ => return None,
                }
                continue;
            }

            match node.find_common_child(token) {
                Some((i, common)) if common == node.static_children[i].path.len() => {
                    node = &mut node.static_children[i];
                    path = &path[common..];
                }
                _ => return None,
            }
        }
    }

    /// The actual insertion. Conflicts were ruled out by `probe`, so the
    /// descent only appends nodes, splits fragments, and bumps priorities.
    fn insert(&mut self, path: &str) -> &mut Node<T> {
        if path.is_empty() {
            return self;
        }

        let (token, rest) = next_token(path);

        if let Some(name) = token.strip_prefix(':') {
            let wildcard = self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new_wildcard(name)));
            wildcard.priority += 1;
            return wildcard.insert(rest);
        }

        match self.find_common_child(token) {
            // No child shares the first byte: append the whole token.
            None => {
                self.indices.push(token.as_bytes()[0]);
                self.static_children.push(Node::new_static(token));
                let i = self.bump_child(self.static_children.len() - 1);
                self.static_children[i].insert(rest)
            }
            // The child's fragment is a prefix of (or equals) the token:
            // descend with whatever follows it.
            Some((i, common)) if common == self.static_children[i].path.len() => {
                let i = self.bump_child(i);
                self.static_children[i].insert(&path[common..])
            }
            // Divergence inside the child's fragment: split. A middle node
            // takes the shared prefix, the old child keeps the tail.
            Some((i, common)) => {
                let child = &mut self.static_children[i];
                let mut demoted =
                    std::mem::replace(child, Node::new_static(&token[..common]));
                demoted.path.drain(..common);

                child.priority = demoted.priority;
                child.indices.push(demoted.path.as_bytes()[0]);
                child.static_children.push(demoted);

                let i = self.bump_child(i);
                self.static_children[i].insert(&path[common..])
            }
        }
    }

    /// Among the static children, the one sharing a first byte with `token`
    /// (there is at most one), plus the length of their common prefix.
    fn find_common_child(&self, token: &str) -> Option<(usize, usize)> {
        let first = token.as_bytes()[0];
        let i = self.indices.iter().position(|&b| b == first)?;
        let common = token
            .as_bytes()
            .iter()
            .zip(self.static_children[i].path.as_bytes())
            .take_while(|(a, b)| a == b)
            .count();
        Some((i, common))
    }

    /// Bump the priority of `static_children[i]`, then bubble it left while
    /// it outranks its neighbour, keeping `indices` in lockstep. Returns the
    /// child's new position. Equal priorities keep insertion order.
    fn bump_child(&mut self, mut i: usize) -> usize {
        self.static_children[i].priority += 1;
        while i > 0 && self.static_children[i - 1].priority < self.static_children[i].priority {
            self.static_children.swap(i - 1, i);
            self.indices.swap(i - 1, i);
            i -= 1;
        }
        i
    }
}

/// Split off the next pattern token: a lone `/`, a fragment up to the next
/// `/` (which stays in the remainder), or the whole tail.
fn next_token(path: &str) -> (&str, &str) {
    if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else if let Some(i) = path.find('/') {
        (&path[..i], &path[i..])
    } else {
        (path, "")
    }
}

/// Pattern-level validation: parameter name syntax and per-path uniqueness.
/// Structural conflicts against already-registered routes are caught during
/// the probe walk instead.
fn validate_pattern(path: &str) -> Result<(), RouterError> {
    let mut seen: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        if let Some(name) = segment.strip_prefix(':') {
            if !valid_param_name(name) {
                return Err(RouterError::InvalidParamName(name.to_string()));
            }
            if seen.contains(&name) {
                return Err(RouterError::DuplicateParamName(name.to_string()));
            }
            seen.push(name);
        }
    }
    Ok(())
}

fn valid_param_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
impl<T> Node<T> {
    /// Indented one-line-per-node rendering for test diagnostics.
    fn print_tree(&self, indent: &str, marker: &str) -> String {
        let mut methods: Vec<&str> = self.handlers.keys().map(|m| m.as_str()).collect();
        methods.sort_unstable();
        let mut out = format!(
            "{} {:02} {}{} {:?}\n",
            indent, self.priority, marker, self.path, methods
        );
        let indent = format!("{}  ", indent);
        for child in &self.static_children {
            out.push_str(&child.print_tree(&indent, ""));
        }
        if let Some(w) = &self.wildcard_child {
            out.push_str(&w.print_tree(&indent, ":"));
        }
        out
    }

    /// Recursively asserts the structural invariants; returns the subtree's
    /// route count.
    fn check_invariants(&self) -> u32 {
        assert_eq!(
            self.indices.len(),
            self.static_children.len(),
            "indices out of lockstep\n{}",
            self.print_tree("", "")
        );
        for (i, child) in self.static_children.iter().enumerate() {
            assert!(!child.path.is_empty(), "empty static fragment");
            assert_eq!(
                self.indices[i],
                child.path.as_bytes()[0],
                "index byte does not match child fragment\n{}",
                self.print_tree("", "")
            );
        }
        let mut bytes = self.indices.clone();
        bytes.sort_unstable();
        bytes.dedup();
        assert_eq!(bytes.len(), self.indices.len(), "duplicate index byte");

        for pair in self.static_children.windows(2) {
            assert!(
                pair[0].priority >= pair[1].priority,
                "children not in descending priority order\n{}",
                self.print_tree("", "")
            );
        }

        if self.is_wildcard {
            assert!(
                self.wildcard_child.is_none(),
                "wildcard directly inside wildcard"
            );
        }

        let mut routes = if self.handlers.is_empty() { 0 } else { 1 };
        for child in &self.static_children {
            routes += child.check_invariants();
        }
        if let Some(w) = &self.wildcard_child {
            assert!(w.is_wildcard);
            routes += w.check_invariants();
        }
        assert_eq!(
            self.priority,
            routes,
            "priority does not count subtree routes at '{}'\n{}",
            self.path,
            self.print_tree("", "")
        );
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Registers each pattern (canonical form, no leading slash) with a
    /// numbered GET handler, the way the router drives the trie.
    fn build(patterns: &[&str]) -> Node<usize> {
        let mut root = Node::new_root();
        for (i, pattern) in patterns.iter().enumerate() {
            let leaf = root.add_path(pattern).expect("registration failed");
            leaf.set_handler("GET", i);
        }
        root.check_invariants();
        root
    }

    fn found(root: &Node<usize>, path: &str) -> (usize, Params) {
        let (node, params) = root.find(path);
        let node = node.unwrap_or_else(|| panic!("no match for {path}\n{}", root.print_tree("", "")));
        let value = *node
            .handlers
            .get("GET")
            .unwrap_or_else(|| panic!("matched an interior node for {path}"));
        (value, params)
    }

    fn param_pairs(params: &Params) -> Vec<(String, String)> {
        params
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }

    #[test]
    fn test_static_routes() {
        let root = build(&["users", "posts"]);

        let (value, params) = found(&root, "users");
        assert_eq!(value, 0);
        assert!(params.is_empty());

        let (value, _) = found(&root, "posts");
        assert_eq!(value, 1);

        assert!(root.find("unknown").0.is_none());
    }

    #[test]
    fn test_wildcard_routes_and_params() {
        let root = build(&[
            "users",
            "users/:id",
            "users/:id/files",
            "users/:id/friends",
        ]);

        let (value, params) = found(&root, "users");
        assert_eq!(value, 0);
        assert!(params.is_empty());

        let (value, params) = found(&root, "users/42/friends");
        assert_eq!(value, 3);
        assert_eq!(
            param_pairs(&params),
            vec![("id".to_string(), "42".to_string())]
        );

        assert!(root.find("users/42/x").0.is_none());
    }

    #[test]
    fn test_priorities_count_subtree_routes() {
        let root = build(&[
            "users",
            "users/:id",
            "users/:id/files",
            "users/:id/friends",
        ]);

        let users = &root.static_children[0];
        assert_eq!(users.path, "users");
        assert_eq!(users.priority, 4);

        let slash = &users.static_children[0];
        let id = slash.wildcard_child.as_deref().unwrap();
        assert_eq!(id.path, "id");
        assert_eq!(id.priority, 3);
    }

    #[test]
    fn test_multiple_params_in_order() {
        let root = build(&["images/:id/similar/:similarId/comments/:commentId"]);

        let (value, params) = found(&root, "images/2/similar/12/comments/1234");
        assert_eq!(value, 0);
        assert_eq!(
            param_pairs(&params),
            vec![
                ("id".to_string(), "2".to_string()),
                ("similarId".to_string(), "12".to_string()),
                ("commentId".to_string(), "1234".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_creates_middle_node() {
        let root = build(&["users/:id/filesystem", "users/:id/filet"]);

        let (value, _) = found(&root, "users/7/filesystem");
        assert_eq!(value, 0);
        let (value, _) = found(&root, "users/7/filet");
        assert_eq!(value, 1);

        // users -> "/" -> :id -> "/" -> "file" -> {"system", "t"}
        let users = &root.static_children[0];
        let id = users.static_children[0].wildcard_child.as_deref().unwrap();
        let file = &id.static_children[0].static_children[0];
        assert_eq!(file.path, "file", "\n{}", root.print_tree("", ""));
        assert_eq!(file.static_children.len(), 2);
        assert!(file.handlers.is_empty());
    }

    #[test]
    fn test_static_beats_wildcard() {
        let root = build(&["users/me", "users/:id"]);

        let (value, params) = found(&root, "users/me");
        assert_eq!(value, 0);
        assert!(params.is_empty());

        let (value, params) = found(&root, "users/alice");
        assert_eq!(value, 1);
        assert_eq!(params.get("id"), Some("alice"));
    }

    #[test]
    fn test_trailing_slash_forgiven() {
        let root = build(&["posts", "users/:id"]);

        let (a, _) = found(&root, "posts");
        let (b, _) = found(&root, "posts/");
        assert_eq!(a, b);

        let (_, params) = found(&root, "users/42/");
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_empty_segment_is_a_miss() {
        let root = build(&["users/:id/files"]);
        assert!(root.find("users//files").0.is_none());
    }

    #[test]
    fn test_partial_fragment_mismatch_is_a_miss() {
        let root = build(&["users"]);
        assert!(root.find("uxers").0.is_none());
        assert!(root.find("user").0.is_none());
        assert!(root.find("userside").0.is_none());
    }

    #[test]
    fn test_root_route() {
        let mut root = Node::new_root();
        let leaf = root.add_path("").expect("root registration failed");
        leaf.set_handler("GET", 9usize);
        root.check_invariants();

        let (node, params) = root.find("");
        assert_eq!(*node.unwrap().handlers.get("GET").unwrap(), 9);
        assert!(params.is_empty());
    }

    #[test]
    fn test_second_method_reuses_terminal() {
        let mut root = Node::new_root();
        let leaf = root.add_path("posts").expect("first registration");
        leaf.set_handler("GET", 0usize);
        let leaf = root.add_path("posts").expect("second registration");
        leaf.set_handler("POST", 1usize);

        assert_eq!(root.priority, 1);
        assert_eq!(root.static_children[0].priority, 1);
        assert_eq!(root.static_children[0].handlers.len(), 2);
        root.check_invariants();
    }

    #[test]
    fn test_busy_branches_bubble_to_front() {
        let root = build(&["alpha/one", "beta/one", "beta/two", "beta/three"]);

        assert_eq!(root.indices[0], b'b');
        assert_eq!(root.static_children[0].path, "beta");
        assert_eq!(root.static_children[0].priority, 3);
        assert_eq!(root.static_children[1].priority, 1);
    }

    #[test]
    fn test_wildcard_name_conflict() {
        let mut root: Node<usize> = Node::new_root();
        root.add_path("users/:id").expect("first registration");

        match root.add_path("users/:uid") {
            Err(RouterError::WildcardConflict {
                existing,
                conflicting,
            }) => {
                assert_eq!(existing, "id");
                assert_eq!(conflicting, "uid");
            }
            other => panic!("expected wildcard conflict, got {:?}", other.map(|_| ())),
        }
        // Failed registration leaves the structure untouched.
        root.check_invariants();
    }

    #[test]
    fn test_invalid_param_names() {
        let mut root: Node<usize> = Node::new_root();
        assert!(matches!(
            root.add_path("users/:"),
            Err(RouterError::InvalidParamName(_))
        ));
        assert!(matches!(
            root.add_path("users/:1bad"),
            Err(RouterError::InvalidParamName(_))
        ));
        assert!(matches!(
            root.add_path("users/:a-b"),
            Err(RouterError::InvalidParamName(_))
        ));
        root.check_invariants();
    }

    #[test]
    fn test_duplicate_param_name_in_one_path() {
        let mut root: Node<usize> = Node::new_root();
        assert!(matches!(
            root.add_path("users/:id/files/:id"),
            Err(RouterError::DuplicateParamName(_))
        ));
    }

    #[test]
    fn test_registered_paths_round_trip() {
        let patterns = [
            "users",
            "users/:id",
            "users/:id/files",
            "users/:id/friends",
            "ideas/:id",
            "images/:id",
            "images/:id/similar/:similarId",
            "posts/recent",
            "posts/:post_id/comments",
        ];
        let root = build(&patterns);

        for (i, pattern) in patterns.iter().enumerate() {
            // Substitute concrete values for the wildcard segments.
            let mut expected: Vec<(String, String)> = Vec::new();
            let concrete: Vec<String> = pattern
                .split('/')
                .enumerate()
                .map(|(j, seg)| match seg.strip_prefix(':') {
                    Some(name) => {
                        let value = format!("v{}", j);
                        expected.push((name.to_string(), value.clone()));
                        value
                    }
                    None => seg.to_string(),
                })
                .collect();
            let request = concrete.join("/");

            let (value, params) = found(&root, &request);
            assert_eq!(value, i, "wrong terminal for {request}");
            assert_eq!(param_pairs(&params), expected, "wrong params for {request}");
        }
    }
}
