
/// Phred-scaled base qualities for the reads in one sample group, split by the allele each read supports.
/// The caller decides which allele is "top1" (most observed) and which is "top2".
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GroupEvidence {
    /// Base qualities of reads supporting the top1 allele
    top1_quals: Vec<u8>,
    /// Base qualities of reads supporting the top2 allele
    top2_quals: Vec<u8>
}

impl GroupEvidence {
    /// Creates a new evidence group, either list may be empty.
    /// # Arguments
    /// * `top1_quals` - Phred scores for reads supporting top1
    /// * `top2_quals` - Phred scores for reads supporting top2
    pub fn new(top1_quals: Vec<u8>, top2_quals: Vec<u8>) -> GroupEvidence {
        GroupEvidence {
            top1_quals,
            top2_quals
        }
    }

    /// Creates a group with no reads at all
    pub fn empty() -> GroupEvidence {
        Self::default()
    }

    pub fn top1_quals(&self) -> &[u8] {
        &self.top1_quals
    }

    pub fn top2_quals(&self) -> &[u8] {
        &self.top2_quals
    }

    /// Number of reads supporting top1, `m` in the likelihood model
    pub fn top1_count(&self) -> usize {
        self.top1_quals.len()
    }

    /// Number of reads supporting top2, `n` in the likelihood model
    pub fn top2_count(&self) -> usize {
        self.top2_quals.len()
    }

    /// Total number of reads in the group, `tn = m + n`
    pub fn total(&self) -> usize {
        self.top1_quals.len() + self.top2_quals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Returns a copy with the top1 and top2 roles exchanged
    pub fn swapped(&self) -> GroupEvidence {
        GroupEvidence {
            top1_quals: self.top2_quals.clone(),
            top2_quals: self.top1_quals.clone()
        }
    }
}

/// All of the read evidence for a single genomic site.
/// Treatment evidence is required by the heterozygous models, control evidence is optional.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SiteEvidence {
    /// The treatment (e.g. ChIP) reads
    treatment: GroupEvidence,
    /// The control (e.g. input) reads, may be empty
    control: GroupEvidence
}

impl SiteEvidence {
    /// Creates site evidence from two already-built groups
    /// # Arguments
    /// * `treatment` - the treatment group
    /// * `control` - the control group, use `GroupEvidence::empty()` when there is no control
    pub fn new(treatment: GroupEvidence, control: GroupEvidence) -> SiteEvidence {
        SiteEvidence {
            treatment,
            control
        }
    }

    /// Convenience constructor from the four quality lists.
    /// # Arguments
    /// * `treat_top1` - treatment reads supporting top1
    /// * `treat_top2` - treatment reads supporting top2
    /// * `ctrl_top1` - control reads supporting top1
    /// * `ctrl_top2` - control reads supporting top2
    pub fn from_quals(treat_top1: Vec<u8>, treat_top2: Vec<u8>, ctrl_top1: Vec<u8>, ctrl_top2: Vec<u8>) -> SiteEvidence {
        SiteEvidence {
            treatment: GroupEvidence::new(treat_top1, treat_top2),
            control: GroupEvidence::new(ctrl_top1, ctrl_top2)
        }
    }

    pub fn treatment(&self) -> &GroupEvidence {
        &self.treatment
    }

    pub fn control(&self) -> &GroupEvidence {
        &self.control
    }

    /// Returns the site with top1 and top2 exchanged in both groups
    pub fn swapped(&self) -> SiteEvidence {
        SiteEvidence {
            treatment: self.treatment.swapped(),
            control: self.control.swapped()
        }
    }
}
