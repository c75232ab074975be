use arbor_protocol::{ClumpId, ConlluId, Indices};
use hecs::{Entity, World};

use crate::components::{TokenData, TokenKind};

/// Running counters of one numbering pass.
#[derive(Default)]
struct Counter {
    absolute: u32,
    word: u32,
    empty: u32,
    cg3: u32,
    clump: u32,
}

impl Counter {
    /// Number the next syntactic word; empty nodes hang off the last integral word.
    fn next_word(&mut self, is_empty: bool) -> (ConlluId, u32) {
        self.absolute += 1;
        self.cg3 += 1;
        let id = if is_empty {
            self.empty += 1;
            ConlluId::Empty(self.word, self.empty)
        } else {
            self.word += 1;
            self.empty = 0;
            ConlluId::Word(self.word)
        };
        (id, self.cg3)
    }
}

fn is_empty(world: &World, token: Entity) -> bool {
    world
        .get::<&TokenData>(token)
        .map(|data| data.is_empty)
        .unwrap_or(false)
}

fn store(world: &World, token: Entity, indices: Indices) {
    match world.get::<&mut Indices>(token) {
        Ok(mut slot) => *slot = indices,
        Err(_) => debug_assert!(false, "token {:?} has no index record", token),
    }
}

/// Recompute every numbering scheme for the whole sentence in one pass.
///
/// Each top-level unit opens a new clump; multiword members share it and are
/// numbered right after their multiword token.
pub fn run(world: &World, order: &[Entity]) {
    let mut counter = Counter::default();

    for &unit in order {
        counter.clump += 1;
        let clump = Some(ClumpId::new(counter.clump));

        let kind = world.get::<&TokenKind>(unit).map(|kind| (*kind).clone());
        match kind {
            Ok(TokenKind::Super { members }) => {
                counter.absolute += 1;
                let absolute = counter.absolute;
                let mut span: Option<(u32, u32)> = None;

                for &member in &members {
                    let (id, cg3) = counter.next_word(is_empty(world, member));
                    // A range only spans integral words
                    if let Some(n) = id.word() {
                        span = Some(span.map_or((n, n), |(first, _)| (first, n)));
                    }
                    store(world, member, Indices {
                        absolute: counter.absolute,
                        conllu: Some(id),
                        cg3: Some(cg3),
                        clump,
                    });
                }

                store(world, unit, Indices {
                    absolute,
                    conllu: span.map(|(first, last)| ConlluId::Range(first, last)),
                    cg3: None,
                    clump,
                });
            }
            Ok(_) => {
                let (id, cg3) = counter.next_word(is_empty(world, unit));
                store(world, unit, Indices {
                    absolute: counter.absolute,
                    conllu: Some(id),
                    cg3: Some(cg3),
                    clump,
                });
            }
            Err(_) => debug_assert!(false, "unit {:?} has no token kind", unit),
        }
    }

    tracing::trace!(units = order.len(), tokens = counter.absolute, "re-indexed sentence");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Heads;

    fn spawn(world: &mut World, kind: TokenKind, data: TokenData) -> Entity {
        world.spawn((kind, data, Heads::default(), Indices::default()))
    }

    #[test]
    fn test_range_skips_empty_members() {
        let mut world = World::new();
        let a = spawn(&mut world, TokenKind::Plain, TokenData::word("a"));
        let sup = world.spawn((TokenKind::Super { members: Vec::new() }, TokenData::word("xy"), Indices::default()));
        let x = spawn(&mut world, TokenKind::Sub { parent: sup }, TokenData::empty());
        let y = spawn(&mut world, TokenKind::Sub { parent: sup }, TokenData::word("y"));
        if let Ok(mut kind) = world.get::<&mut TokenKind>(sup) {
            *kind = TokenKind::Super { members: vec![x, y] };
        }

        run(&world, &[a, sup]);

        let conllu = |e| world.get::<&Indices>(e).unwrap().conllu;
        assert_eq!(conllu(a), Some(ConlluId::Word(1)));
        assert_eq!(conllu(x), Some(ConlluId::Empty(1, 1)));
        assert_eq!(conllu(y), Some(ConlluId::Word(2)));
        assert_eq!(conllu(sup), Some(ConlluId::Range(2, 2)));
        assert_eq!(conllu(sup).and_then(|id| id.word()), None);
    }
}
