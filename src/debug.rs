extern crate std;

use std::{collections::VecDeque, fmt, prelude::v1::*};

use crate::{
    inspect::{Inspect, NodeView},
    Sequence,
};

impl<V: fmt::Display> Sequence<V> {
    /// Writes a Graphviz rendering of the tree to `w`, with one rank per tree level.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root() {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<'a, V> {
            Node(NodeView<'a, V>, usize),
            Missing(usize),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root, 0));
        let mut next_id = 1;

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _rank_node in 0..queue.len() {
                let (node, id) = match queue.pop_front() {
                    Some(Item::Node(node, id)) => (node, id),
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                write!(w, "\"graph{name}-{id}\" [label=\"{}\"]; ", node.value())?;

                for child in [node.left(), node.right()] {
                    let child_id = next_id;
                    next_id += 1;

                    if let Some(child) = child {
                        queue.push_back(Item::Node(child, child_id));
                        writeln!(links, "\"graph{name}-{id}\" -> \"graph{name}-{child_id}\";")?;
                    } else {
                        queue.push_back(Item::Missing(child_id));
                        writeln!(
                            links,
                            "\"graph{name}-{id}\" -> \"graph{name}-missing{child_id}\";"
                        )?;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
