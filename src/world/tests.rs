use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use crate::prelude::*;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
struct A(u32);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
struct B(u32);

#[derive(Component, Debug, Clone, Copy, PartialEq)]
struct C(u32);

#[derive(Component, Debug, Default, PartialEq)]
struct Transform(i32);

#[derive(Component, Debug, PartialEq)]
#[require(Transform, Velocity = Velocity(1))]
struct Player;

#[derive(Component, Debug, PartialEq)]
struct Velocity(i32);

#[test]
fn round_trip() {
    let mut world = World::new();
    let entity = world.spawn((A(1), B(2), C(3))).unwrap();

    assert_eq!(world.get::<A>(entity).unwrap(), &A(1));
    assert_eq!(world.get::<(C, A)>(entity).unwrap(), (&C(3), &A(1)));
    assert_eq!(world.get::<(A, B, C)>(entity).unwrap(), (&A(1), &B(2), &C(3)));
    assert!(world.has_component::<A>(entity).unwrap());
    assert!(world.has_component::<B>(entity).unwrap());
    assert!(world.has_component::<C>(entity).unwrap());
    assert!(!world.has_component::<Transform>(entity).unwrap());
}

#[test]
fn has_component_by_id() {
    let mut world = World::new();
    let entity = world.spawn(A(0)).unwrap();
    let a = world.component_id::<A>().unwrap();
    let b = world.register_component::<B>();

    assert_eq!(world.has_component_id(entity, a), Ok(true));
    assert_eq!(world.has_component_id(entity, b), Ok(false));

    world.delete(entity).unwrap();

    assert_eq!(world.has_component_id(entity, a), Err(EntityNotFound(entity)));
    assert_eq!(world.has_component::<A>(entity), Err(EntityNotFound(entity)));
}

#[test]
fn duplicate_spawn_is_rejected() {
    let mut world = World::new();

    world.spawn(A(0)).unwrap();

    let error = world.spawn((A(1), B(2), A(3))).unwrap_err();

    assert!(matches!(
        error,
        WorldError::DuplicateComponent { first: 0, second: 2, .. },
    ));
    assert_eq!(world.count_entities(), 1);
    assert_eq!(world.count_components(), 1);
}

#[test]
fn duplicate_get_is_rejected() {
    let mut world = World::new();
    let entity = world.spawn(A(0)).unwrap();

    assert!(matches!(
        world.get_mut::<(A, A)>(entity),
        Err(WorldError::DuplicateComponent { .. }),
    ));
}

#[test]
fn duplicate_insert_and_remove_are_rejected() {
    let mut world = World::new();
    let entity = world.spawn(A(0)).unwrap();

    assert_eq!(
        world.insert(entity, (B(0), B(1))),
        Err(WorldError::DuplicateComponent {
            component: std::any::type_name::<B>(),
            first: 0,
            second: 1,
        }),
    );
    assert!(matches!(
        world.remove::<(A, A)>(entity),
        Err(WorldError::DuplicateComponent { first: 0, second: 1, .. }),
    ));

    assert!(!world.has_component::<B>(entity).unwrap());
    assert_eq!(world.get::<A>(entity).unwrap(), &A(0));
}

#[test]
fn structural_move_preserves_data() {
    let mut world = World::new();
    let entity = world.spawn(A(10)).unwrap();

    world.insert(entity, B(0)).unwrap();

    assert_eq!(world.get::<A>(entity).unwrap(), &A(10));
    assert_eq!(world.get::<B>(entity).unwrap(), &B(0));
    assert_eq!(world.count_components(), 2);
}

#[test]
fn swap_remove_fixes_up_rows() {
    let mut world = World::new();
    let entities = world.spawn_iter((0..100).map(A)).unwrap();

    world.delete(entities[0]).unwrap();

    for (value, &entity) in entities.iter().enumerate().skip(1) {
        assert_eq!(world.get::<A>(entity).unwrap(), &A(value as u32));
    }

    assert_eq!(world.count_entities(), 99);
}

#[test]
fn moving_out_fixes_up_rows() {
    let mut world = World::new();
    let first = world.spawn((A(1), B(1))).unwrap();
    let second = world.spawn((A(2), B(2))).unwrap();
    let third = world.spawn((A(3), B(3))).unwrap();

    world.remove::<B>(first).unwrap();

    assert_eq!(world.get::<(A, B)>(second).unwrap(), (&A(2), &B(2)));
    assert_eq!(world.get::<(A, B)>(third).unwrap(), (&A(3), &B(3)));
    assert_eq!(world.get::<A>(first).unwrap(), &A(1));
    assert!(!world.has_component::<B>(first).unwrap());
}

#[test]
fn required_components_on_spawn() {
    let mut world = World::new();
    let player = world.spawn(Player).unwrap();

    assert_eq!(world.get::<Transform>(player).unwrap(), &Transform(0));
    assert_eq!(world.get::<Velocity>(player).unwrap(), &Velocity(1));
}

#[test]
fn explicit_components_override_requirements() {
    let mut world = World::new();
    let player = world.spawn((Player, Velocity(5))).unwrap();

    assert_eq!(world.get::<Velocity>(player).unwrap(), &Velocity(5));
    assert_eq!(world.count_components(), 3);
}

#[test]
fn required_components_on_insert() {
    let mut world = World::new();
    let entity = world.spawn(Transform(7)).unwrap();

    world.insert(entity, Player).unwrap();

    assert_eq!(world.get::<Transform>(entity).unwrap(), &Transform(7));
    assert_eq!(world.get::<Velocity>(entity).unwrap(), &Velocity(1));
}

#[test]
fn required_components_of() {
    let mut world = World::new();
    let required = world.required_components_of::<Player>();

    assert_eq!(required.len(), 2);
    assert!(required.contains(&ComponentInfo::of::<Transform>()));
    assert!(required.contains(&ComponentInfo::of::<Velocity>()));
}

#[test]
fn insert_partial_failure() {
    let mut world = World::new();
    let entity = world.spawn((A(1), B(1))).unwrap();
    let error = world.insert(entity, (B(2), C(3))).unwrap_err();

    assert!(matches!(
        error,
        WorldError::ComponentAlreadyPresent { entity: e, .. } if e == entity,
    ));
    assert_eq!(world.get::<B>(entity).unwrap(), &B(1));
    assert_eq!(world.get::<C>(entity).unwrap(), &C(3));
}

#[test]
fn insert_reports_every_present_component() {
    let mut world = World::new();
    let entity = world.spawn((A(1), B(1))).unwrap();
    let version = world.version();
    let error = world.insert(entity, (A(2), B(2))).unwrap_err();

    assert_eq!(error.errors().len(), 2);
    assert_eq!(world.version(), version, "nothing moved");
    assert_eq!(world.get::<(A, B)>(entity).unwrap(), (&A(1), &B(1)));
}

#[test]
fn remove_partial_failure() {
    let mut world = World::new();
    let entity = world.spawn((A(1), B(1))).unwrap();
    let error = world.remove::<(B, C)>(entity).unwrap_err();

    assert!(matches!(error, WorldError::ComponentNotFound(_)));
    assert!(!world.has_component::<B>(entity).unwrap());
    assert_eq!(world.get::<A>(entity).unwrap(), &A(1));
}

#[test]
fn structural_operations_on_missing_entity() {
    let mut world = World::new();
    let entity = world.spawn(()).unwrap();

    world.delete(entity).unwrap();

    assert_eq!(world.delete(entity), Err(EntityNotFound(entity)));
    assert!(matches!(
        world.insert(entity, A(0)),
        Err(WorldError::EntityNotFound(_)),
    ));
    assert!(matches!(
        world.remove::<A>(entity),
        Err(WorldError::EntityNotFound(_)),
    ));
    assert!(matches!(
        world.get::<A>(entity),
        Err(WorldError::EntityNotFound(_)),
    ));
}

#[test]
fn deleted_ids_are_never_reused() {
    let mut world = World::new();
    let first = world.spawn(A(0)).unwrap();

    world.delete(first).unwrap();

    let second = world.spawn(A(0)).unwrap();

    assert_ne!(first, second);
    assert!(!world.contains(first));
    assert!(world.contains(second));
}

#[test]
fn delete_drops_components() {
    #[derive(Component)]
    struct Counted(Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let mut world = World::new();
    let first = world.spawn(Counted(drops.clone())).unwrap();
    let second = world.spawn((Counted(drops.clone()), A(0))).unwrap();

    world.delete(first).unwrap();
    world.remove::<Counted>(second).unwrap();

    assert_eq!(drops.load(Ordering::Relaxed), 2);
}

#[test]
fn get_mut_writes_through() {
    let mut world = World::new();
    let entity = world.spawn((A(1), B(2))).unwrap();
    let (a, b) = world.get_mut::<(A, B)>(entity).unwrap();

    a.0 += 10;
    b.0 += 20;

    assert_eq!(world.get::<(A, B)>(entity).unwrap(), (&A(11), &B(22)));
}

#[test]
fn spawn_iter_shares_an_archetype() {
    let mut world = World::new();
    let entities = world.spawn_iter((0..10).map(|n| (A(n), B(n)))).unwrap();
    let archetypes: Vec<_> = entities
        .iter()
        .map(|&entity| world.entity_location(entity).unwrap().archetype)
        .collect();

    assert!(archetypes.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(world.iter().len(), 10);
    assert_eq!(world.count_components(), 20);
}

#[test]
fn clear_deletes_all_entities() {
    let mut world = World::new();
    let entities = world.spawn_iter((0..10).map(|_| ())).unwrap();

    world.clear();

    for entity in entities {
        assert!(!world.contains(entity));
    }

    assert_eq!(world.count_entities(), 0);
    assert!(world.spawn(()).is_ok());
}

#[test]
fn archetype_lookup_is_order_independent() {
    let mut world = World::new();

    world.spawn((A(0), B(0))).unwrap();
    world.spawn((B(0), A(0))).unwrap();

    let a = world.component_id::<A>().unwrap();
    let b = world.component_id::<B>().unwrap();
    let id = world.archetype_id(&[b, a]).unwrap();

    assert_eq!(world.archetype_id(&[a, b]), Some(id));
    assert_eq!(world.archetype(id).unwrap().len(), 2);
}

#[test]
fn worlds_have_independent_component_ids() {
    let mut first = World::new();
    let mut second = World::new();

    first.register_component::<A>();

    assert_ne!(first.id(), second.id());
    assert_ne!(
        first.register_component::<B>(),
        second.register_component::<B>(),
    );
}

#[test]
fn resources() {
    #[derive(Resource, Debug, PartialEq)]
    struct Gravity(i32);

    let mut world = World::new();

    assert!(!world.has_resource::<Gravity>());
    assert_eq!(world.insert_resource(Gravity(-10)), None);

    world.resource_mut::<Gravity>().unwrap().0 *= 2;

    assert_eq!(*world.resource::<Gravity>().unwrap(), Gravity(-20));
    assert_eq!(world.remove_resource::<Gravity>(), Ok(Gravity(-20)));
}

/// Tests that the world can handle large amounts of entities.
#[test]
#[cfg_attr(miri, ignore)]
fn spawn_many() {
    let mut world = World::new();
    let entities = world
        .spawn_iter((0..100_000).map(|n| (A(n), B(n))))
        .unwrap();

    assert_eq!(entities.len(), 100_000);
}

#[derive(Debug, Clone)]
enum Op {
    Spawn(u32),
    Insert(usize, u32),
    Remove(usize),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u32>().prop_map(Op::Spawn),
        (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        any::<usize>().prop_map(Op::Remove),
        any::<usize>().prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn rows_stay_consistent(ops in prop::collection::vec(op(), 1..64)) {
        let mut world = World::new();
        let mut model: Vec<(EntityId, u32, Option<u32>)> = Vec::new();

        for op in ops {
            match op {
                Op::Spawn(value) => {
                    model.push((world.spawn(A(value)).unwrap(), value, None));
                },
                Op::Insert(index, value) if !model.is_empty() => {
                    let len = model.len();
                    let entry = &mut model[index % len];
                    let result = world.insert(entry.0, B(value));

                    prop_assert_eq!(result.is_ok(), entry.2.is_none());
                    entry.2.get_or_insert(value);
                },
                Op::Remove(index) if !model.is_empty() => {
                    let len = model.len();
                    let entry = &mut model[index % len];
                    let result = world.remove::<B>(entry.0);

                    prop_assert_eq!(result.is_ok(), entry.2.is_some());
                    entry.2 = None;
                },
                Op::Delete(index) if !model.is_empty() => {
                    let (entity, ..) = model.swap_remove(index % model.len());

                    prop_assert!(world.delete(entity).is_ok());
                },
                _ => {},
            }
        }

        prop_assert_eq!(world.count_entities(), model.len());

        for &(entity, a, b) in &model {
            prop_assert_eq!(world.get::<A>(entity).unwrap(), &A(a));
            prop_assert_eq!(world.get::<B>(entity).ok().map(|b| b.0), b);
        }

        for archetype in world.archetypes() {
            prop_assert!(archetype.is_consistent());

            for (row, &entity) in archetype.entities().iter().enumerate() {
                let location = world.entity_location(entity).unwrap();

                prop_assert_eq!(location.row, row);
                prop_assert_eq!(location.archetype, archetype.id());
            }
        }
    }
}
