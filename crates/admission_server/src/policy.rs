use clap::ValueEnum;

/// Overload policy consulted by [`crate::queue::AdmissionQueue::try_admit`] whenever
/// occupancy is at capacity. Immutable for the lifetime of the process, selected once
/// from the CLI token set `{block, dt, dh, random}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
	Block,
	#[value(name = "dt")]
	DropTail,
	#[value(name = "dh")]
	DropHead,
	#[value(name = "random")]
	DropRandom,
}

impl Policy {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Block => "block",
			Self::DropTail => "dt",
			Self::DropHead => "dh",
			Self::DropRandom => "random",
		}
	}
}

impl std::fmt::Display for Policy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
