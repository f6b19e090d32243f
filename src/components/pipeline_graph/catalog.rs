use std::fmt;

/// Stable key of one pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageId(&'static str);

impl StageId {
	pub const fn new(id: &'static str) -> Self {
		Self(id)
	}

	pub fn as_str(&self) -> &'static str {
		self.0
	}
}

impl fmt::Display for StageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.0)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageNode {
	pub id: StageId,
	pub label: &'static str,
}

/// Terminal stage; its node shows the run's packet artifact when one exists.
pub const PACKET: StageId = StageId::new("packet");

/// The fixed pipeline, in execution order. Consecutive entries are joined by an edge.
pub const CATALOG: &[StageNode] = &[
	StageNode {
		id: StageId::new("news"),
		label: "News",
	},
	StageNode {
		id: StageId::new("parser"),
		label: "Parser",
	},
	StageNode {
		id: StageId::new("brain"),
		label: "Brain",
	},
	StageNode {
		id: StageId::new("watchdog"),
		label: "Watchdog",
	},
	StageNode {
		id: PACKET,
		label: "Packet",
	},
];

/// Index pairs of the chain edges for `nodes`.
pub fn chain_edges(nodes: &[StageNode]) -> impl Iterator<Item = (usize, usize)> + '_ {
	(1..nodes.len()).map(|i| (i - 1, i))
}
