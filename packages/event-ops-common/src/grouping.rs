use crate::random::{shuffle, DrawRng};
use crate::types::{Group, Participant};

/// Shuffle the roster and cut it into consecutive chunks of `group_size`.
///
/// The last group keeps the remainder and may be smaller; it is not
/// redistributed. Groups are numbered from 1 in partition order. A zero
/// group size yields no groups.
pub fn partition_into_groups(
    participants: &[Participant],
    group_size: usize,
    rng: &mut DrawRng,
) -> Vec<Group> {
    if group_size == 0 {
        return Vec::new();
    }
    let mut shuffled = participants.to_vec();
    shuffle(&mut shuffled, rng);

    shuffled
        .chunks(group_size)
        .enumerate()
        .map(|(i, members)| {
            let id = i as u32 + 1;
            Group {
                id,
                name: format!("Group {id}"),
                members: members.to_vec(),
            }
        })
        .collect()
}
