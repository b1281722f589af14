//! Declaration matcher: bind each proposal to exactly one catalog entry.
//!
//! Proposals are grouped against the catalog by `(name, kind)`. When several
//! declarations share that identity (overloads, same-named members of
//! different classes) the signature hint ranks them: an exact parameter count
//! first, then the most matching parameters, ties going to the earliest
//! declaration. Existing documentation is never
//! targeted, and each declaration receives at most one comment.

use crate::model::*;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Result of matching one file's proposal batch against its catalog.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// Ordered by target declaration (source order).
    pub resolved: Vec<ResolvedComment>,
    pub unresolved: Vec<Unresolved>,
    /// Declarations a proposal pointed at that already carry a doc comment.
    pub skipped_documented: Vec<DeclarationKey>,
}

/// Outcome of candidate selection for a single proposal.
#[derive(Debug, PartialEq, Eq)]
enum Selection {
    NotFound,
    OwnerMismatch,
    Chosen {
        target: usize,
        rank: Rank,
        candidates: usize,
    },
}

/// How well a declaration fits a signature hint, compared lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    /// The hint lists exactly as many parameters as the declaration has.
    arity: bool,
    /// Hinted parameters found on the declaration by name (and type, if hinted).
    matched: usize,
}

/// A proposal's current claim on a declaration.
struct Claim {
    proposal: usize,
    rank: Rank,
    resolution: Resolution,
}

/// Match a batch of proposals against a catalog.
pub fn match_proposals(catalog: &Catalog, proposals: &[ProposedComment]) -> MatchOutcome {
    let groups = group_by_identity(catalog);
    let mut outcome = MatchOutcome::default();
    let mut claims: BTreeMap<usize, Claim> = BTreeMap::new();

    for (index, proposal) in proposals.iter().enumerate() {
        let candidates = groups
            .get(&(proposal.name.as_str(), proposal.kind))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let (target, rank, count) = match select(catalog, candidates, proposal) {
            Selection::NotFound => {
                log::debug!("no declaration for {}", proposal.key());
                outcome.unresolved.push(Unresolved {
                    proposal: proposal.key(),
                    reason: UnresolvedReason::NotFound,
                });
                continue;
            }
            Selection::OwnerMismatch => {
                outcome.unresolved.push(Unresolved {
                    proposal: proposal.key(),
                    reason: UnresolvedReason::OwnerMismatch,
                });
                continue;
            }
            Selection::Chosen {
                target,
                rank,
                candidates,
            } => (target, rank, candidates),
        };

        let record = &catalog.records[target];
        if record.has_doc {
            log::debug!("{} is already documented", record.key);
            if !outcome.skipped_documented.contains(&record.key) {
                outcome.skipped_documented.push(record.key.clone());
            }
            continue;
        }

        let resolution = if count == 1 {
            Resolution::Unique
        } else {
            Resolution::AmbiguousResolvedBySignature {
                candidates: count,
                score: rank.matched,
            }
        };

        match claims.entry(target) {
            Entry::Vacant(slot) => {
                slot.insert(Claim {
                    proposal: index,
                    rank,
                    resolution,
                });
            }
            Entry::Occupied(mut slot) => {
                // Better rank takes the declaration; on a tie the earlier proposal keeps it.
                let loser = if rank > slot.get().rank {
                    let previous = slot.insert(Claim {
                        proposal: index,
                        rank,
                        resolution,
                    });
                    previous.proposal
                } else {
                    index
                };
                outcome.unresolved.push(Unresolved {
                    proposal: proposals[loser].key(),
                    reason: UnresolvedReason::Superseded {
                        target: record.key.clone(),
                    },
                });
            }
        }
    }

    outcome.resolved = claims
        .into_iter()
        .map(|(target, claim)| ResolvedComment {
            proposal: proposals[claim.proposal].clone(),
            target,
            resolution: claim.resolution,
        })
        .collect();
    outcome
}

/// Index catalog entries by `(name, kind)`, preserving source order per group.
fn group_by_identity(catalog: &Catalog) -> HashMap<(&str, DeclarationKind), Vec<usize>> {
    let mut groups: HashMap<(&str, DeclarationKind), Vec<usize>> = HashMap::new();
    for (index, record) in catalog.records.iter().enumerate() {
        groups
            .entry((record.key.name.as_str(), record.key.kind))
            .or_default()
            .push(index);
    }
    groups
}

fn select(catalog: &Catalog, candidates: &[usize], proposal: &ProposedComment) -> Selection {
    if candidates.is_empty() {
        return Selection::NotFound;
    }

    let in_owner: Vec<usize> = match proposal.owner.as_deref() {
        Some(owner) => candidates
            .iter()
            .copied()
            .filter(|&i| scope_ends_with(&catalog.records[i].key.scope, owner))
            .collect(),
        None => candidates.to_vec(),
    };
    if in_owner.is_empty() {
        return Selection::OwnerMismatch;
    }

    // Strictly-greater keeps the earliest declaration on ties.
    let mut best = in_owner[0];
    let mut best_rank = signature_rank(proposal.signature.as_ref(), &catalog.records[best]);
    for &candidate in &in_owner[1..] {
        let rank = signature_rank(proposal.signature.as_ref(), &catalog.records[candidate]);
        if rank > best_rank {
            best = candidate;
            best_rank = rank;
        }
    }

    Selection::Chosen {
        target: best,
        rank: best_rank,
        candidates: in_owner.len(),
    }
}

/// `"Shapes.Circle"` matches a scope ending in `["Shapes", "Circle"]`.
fn scope_ends_with(scope: &[String], owner: &str) -> bool {
    let segments: Vec<&str> = owner.split('.').collect();
    scope.len() >= segments.len()
        && scope[scope.len() - segments.len()..]
            .iter()
            .zip(&segments)
            .all(|(a, b)| a == b)
}

/// Rank a declaration against the hint. A hinted type must also match,
/// ignoring whitespace. Without a hint every declaration ranks the same.
fn signature_rank(hint: Option<&SignatureHint>, record: &DeclarationRecord) -> Rank {
    let Some(hint) = hint else {
        return Rank::default();
    };
    let matched = hint
        .params
        .iter()
        .filter(|wanted| {
            record.params.iter().any(|param| {
                param.name == wanted.name
                    && match (&wanted.type_hint, &param.type_hint) {
                        (None, _) => true,
                        (Some(want), Some(have)) => same_type(want, have),
                        (Some(_), None) => false,
                    }
            })
        })
        .count();
    Rank {
        arity: hint.params.len() == record.params.len(),
        matched,
    }
}

fn same_type(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace()) || strip_ws(a) == strip_ws(b)
}

fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
