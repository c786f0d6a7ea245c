use bytes::BufMut;
use ethereum_types::H256;
use forkline_crypto::keccak::keccak_hash;
use forkline_rlp::{
    constants::RLP_NULL,
    encode::{RLPEncode, encode_length},
    structs::Encoder,
};

use crate::{Nibbles, ValueRLP, nibbles::LEAF_FLAG};

/// Reference to a child node as it appears inside its parent's encoding.
///
/// Children whose encoding is shorter than 32 bytes are embedded as-is,
/// everything else is referenced by the keccak of its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeHash {
    Hashed(H256),
    Inline(Vec<u8>),
}

impl NodeHash {
    pub fn from_encoded_raw(encoded: &[u8]) -> Self {
        if encoded.len() >= 32 {
            NodeHash::Hashed(H256(keccak_hash(encoded)))
        } else {
            NodeHash::Inline(encoded.to_vec())
        }
    }

    /// Hash of the referenced node, hashing inlined encodings as well.
    pub fn finalize(&self) -> H256 {
        match self {
            NodeHash::Hashed(hash) => *hash,
            NodeHash::Inline(encoded) => H256(keccak_hash(encoded)),
        }
    }
}

impl RLPEncode for NodeHash {
    fn encode(&self, buf: &mut dyn BufMut) {
        match self {
            NodeHash::Hashed(hash) => hash.encode(buf),
            NodeHash::Inline(encoded) => buf.put_slice(encoded),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Branch(Box<BranchNode>),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

/// Sixteen optional children plus the value of a key ending exactly here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchNode {
    pub choices: [Option<Node>; 16],
    pub value: ValueRLP,
}

/// Shared path segment leading to a single child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionNode {
    pub prefix: Nibbles,
    pub child: Box<Node>,
}

/// Remaining key nibbles (leaf flag included) and the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub partial: Nibbles,
    pub value: ValueRLP,
}

impl Node {
    pub fn leaf(partial: Nibbles, value: ValueRLP) -> Self {
        Node::Leaf(LeafNode { partial, value })
    }

    /// Inserts `value` under the remaining `path`, returning the updated subtree.
    pub fn insert(self, path: Nibbles, value: ValueRLP) -> Node {
        match self {
            Node::Leaf(leaf) => leaf.insert(path, value),
            Node::Extension(ext) => ext.insert(path, value),
            Node::Branch(mut branch) => {
                branch.insert(path, value);
                Node::Branch(branch)
            }
        }
    }

    pub fn get(&self, mut path: Nibbles) -> Option<&ValueRLP> {
        match self {
            Node::Leaf(leaf) => (leaf.partial == path).then_some(&leaf.value),
            Node::Extension(ext) => {
                if path.skip_prefix(&ext.prefix) {
                    ext.child.get(path)
                } else {
                    None
                }
            }
            Node::Branch(branch) => match path.at(0) {
                choice if choice == LEAF_FLAG as usize => {
                    (!branch.value.is_empty()).then_some(&branch.value)
                }
                choice => branch.choices[choice].as_ref()?.get(path.offset(1)),
            },
        }
    }

    /// Encoding of the node itself, as hashed for its parent reference.
    pub fn encode_raw(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn compute_hash(&self) -> NodeHash {
        NodeHash::from_encoded_raw(&self.encode_raw())
    }
}

impl BranchNode {
    fn insert(&mut self, path: Nibbles, value: ValueRLP) {
        match path.at(0) {
            choice if choice == LEAF_FLAG as usize => self.value = value,
            choice => {
                let rest = path.offset(1);
                self.choices[choice] = Some(match self.choices[choice].take() {
                    Some(child) => child.insert(rest, value),
                    None => Node::leaf(rest, value),
                });
            }
        }
    }

    /// Places a subtree whose path starts with `path` (the branch nibble included).
    fn attach(&mut self, path: Nibbles, child: Node) {
        match path.len() {
            0 => {}
            1 => self.choices[path.at(0)] = Some(child),
            _ => {
                self.choices[path.at(0)] = Some(Node::Extension(ExtensionNode {
                    prefix: path.offset(1),
                    child: Box::new(child),
                }))
            }
        }
    }
}

/// Wraps `branch` in an extension when the split happened below the current depth.
fn with_shared_prefix(shared: Nibbles, branch: BranchNode) -> Node {
    let branch = Node::Branch(Box::new(branch));
    if shared.is_empty() {
        branch
    } else {
        Node::Extension(ExtensionNode {
            prefix: shared,
            child: Box::new(branch),
        })
    }
}

impl LeafNode {
    fn insert(self, path: Nibbles, value: ValueRLP) -> Node {
        if self.partial == path {
            return Node::leaf(path, value);
        }
        // Both paths end in the leaf flag, so they diverge before either ends.
        let matched = self.partial.count_prefix(&path);
        let mut branch = BranchNode::default();
        branch.insert(self.partial.offset(matched), self.value);
        branch.insert(path.offset(matched), value);
        with_shared_prefix(path.slice(0, matched), branch)
    }
}

impl ExtensionNode {
    fn insert(mut self, path: Nibbles, value: ValueRLP) -> Node {
        let matched = self.prefix.count_prefix(&path);
        if matched == self.prefix.len() {
            self.child = Box::new(self.child.insert(path.offset(matched), value));
            return Node::Extension(self);
        }
        let mut branch = BranchNode::default();
        branch.attach(self.prefix.offset(matched), *self.child);
        branch.insert(path.offset(matched), value);
        with_shared_prefix(path.slice(0, matched), branch)
    }
}

impl RLPEncode for BranchNode {
    fn encode(&self, buf: &mut dyn BufMut) {
        let mut payload = Vec::new();
        for child in &self.choices {
            match child {
                Some(node) => node.compute_hash().encode(&mut payload),
                None => payload.push(RLP_NULL),
            }
        }
        self.value.as_slice().encode(&mut payload);
        encode_length(payload.len(), buf);
        buf.put_slice(&payload);
    }
}

impl RLPEncode for ExtensionNode {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_bytes(&self.prefix.encode_compact())
            .encode_field(&self.child.compute_hash())
            .finish();
    }
}

impl RLPEncode for LeafNode {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_bytes(&self.partial.encode_compact())
            .encode_bytes(&self.value)
            .finish();
    }
}

impl RLPEncode for Node {
    fn encode(&self, buf: &mut dyn BufMut) {
        match self {
            Node::Branch(n) => n.encode(buf),
            Node::Extension(n) => n.encode(buf),
            Node::Leaf(n) => n.encode(buf),
        }
    }
}
