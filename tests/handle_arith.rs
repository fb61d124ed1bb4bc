//! Arithmetic contract of the handle layer, exercised through the public API.

use vela_core::{CtxtHandle, Engine, Error, Params, Ptxt};

fn demo_engine(seed: u64) -> Engine {
    Engine::new(Params::demo().with_seed(seed)).expect("valid parameters")
}

fn enc(engine: &Engine, values: &[i64]) -> CtxtHandle {
    engine
        .encrypt(&Ptxt::new(values.to_vec()).expect("non-empty"))
        .expect("within range")
}

#[test]
fn additive_identity_and_inverse() {
    let eng = demo_engine(21);
    let a = enc(&eng, &[5, -9, 42]);

    let same = a.try_add(0).unwrap();
    assert_eq!(eng.decrypt(&same).unwrap(), vec![5, -9, 42]);

    let zero = a.try_sub(&a).unwrap();
    assert_eq!(eng.decrypt(&zero).unwrap(), vec![0, 0, 0]);
}

#[test]
fn addition_commutes_and_associates() {
    let eng = demo_engine(22);
    let a = enc(&eng, &[1, 2, 3]);
    let b = enc(&eng, &[10, 20, 30]);
    let c = enc(&eng, &[-4, 0, 7]);

    let ab = a.try_add(&b).unwrap();
    let ba = b.try_add(&a).unwrap();
    assert_eq!(eng.decrypt(&ab).unwrap(), eng.decrypt(&ba).unwrap());

    let ab_c = ab.try_add(&c).unwrap();
    let bc = b.try_add(&c).unwrap();
    let a_bc = a.try_add(&bc).unwrap();
    assert_eq!(eng.decrypt(&ab_c).unwrap(), eng.decrypt(&a_bc).unwrap());
    assert_eq!(eng.decrypt(&ab_c).unwrap(), vec![7, 22, 40]);
}

#[test]
fn multiplication_commutes() {
    let eng = demo_engine(23);
    let a = enc(&eng, &[2, -3, 4]);
    let b = enc(&eng, &[5, 6, -7]);

    let ab = a.try_mul(&b).unwrap();
    let ba = b.try_mul(&a).unwrap();
    assert_eq!(eng.decrypt(&ab).unwrap(), vec![10, -18, -28]);
    assert_eq!(eng.decrypt(&ab).unwrap(), eng.decrypt(&ba).unwrap());
}

#[test]
fn copy_operations_leave_operands_unchanged() {
    let eng = demo_engine(24);
    let a = enc(&eng, &[1, 2, 3]);
    let b = enc(&eng, &[10, 20, 30]);
    let a_ids = a.slot_ids().to_vec();

    let _sum = a.try_add(&b).unwrap();
    let _prod = a.try_mul(&b).unwrap();
    let _dot = a.try_dot(&b).unwrap();

    assert_eq!(a.slot_ids(), &a_ids[..]);
    assert_eq!(eng.decrypt(&a).unwrap(), vec![1, 2, 3]);
    assert_eq!(eng.decrypt(&b).unwrap(), vec![10, 20, 30]);
}

#[test]
fn in_place_mutates_only_the_receiver() {
    let eng = demo_engine(25);
    let mut a = enc(&eng, &[1, 2, 3]);
    let b = enc(&eng, &[10, 20, 30]);
    let a_ids = a.slot_ids().to_vec();

    a.try_add_assign(&b).unwrap();
    a.try_mul_assign(2).unwrap();
    assert_eq!(a.slot_ids(), &a_ids[..]);
    assert_eq!(eng.decrypt(&a).unwrap(), vec![22, 44, 66]);
    assert_eq!(eng.decrypt(&b).unwrap(), vec![10, 20, 30]);
}

#[test]
fn scalar_operands_broadcast() {
    let eng = demo_engine(26);
    let a = enc(&eng, &[1, 2, 3]);

    assert_eq!(eng.decrypt(&a.try_add(7).unwrap()).unwrap(), vec![8, 9, 10]);
    assert_eq!(eng.decrypt(&a.try_sub(1).unwrap()).unwrap(), vec![0, 1, 2]);
    assert_eq!(
        eng.decrypt(&a.try_mul(-3).unwrap()).unwrap(),
        vec![-3, -6, -9]
    );
    assert_eq!(eng.decrypt(&a.try_dot(2).unwrap()).unwrap(), vec![12, 12, 12]);
}

#[test]
fn zero_width_is_rejected() {
    let eng = demo_engine(27);
    assert!(matches!(
        CtxtHandle::new(&eng, 0),
        Err(Error::InvalidLength { given: 0 })
    ));
    assert!(matches!(
        Ptxt::new(vec![]),
        Err(Error::InvalidLength { given: 0 })
    ));
}

#[test]
fn cross_engine_operands_are_refused() {
    let eng = demo_engine(28);
    let other = demo_engine(29);
    let mut a = enc(&eng, &[1, 2]);
    let b = enc(&other, &[1, 2]);

    assert_eq!(a.try_add(&b).unwrap_err(), Error::EngineMismatch);
    assert_eq!(a.try_add_assign(&b).unwrap_err(), Error::EngineMismatch);
    assert_eq!(eng.decrypt(&a).unwrap(), vec![1, 2]);
}

#[test]
fn mismatched_widths_are_refused() {
    let eng = demo_engine(30);
    let a = enc(&eng, &[1, 2, 3, 4]);
    let b = enc(&eng, &[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(
        a.try_add(&b).unwrap_err(),
        Error::LengthMismatch { lhs: 4, rhs: 7 }
    );
    assert_eq!(
        b.try_mul(&a).unwrap_err(),
        Error::LengthMismatch { lhs: 7, rhs: 4 }
    );
}

#[test]
fn out_of_range_scalars_are_refused() {
    let eng = demo_engine(31);
    let bound = eng.plain_bound();
    let a = enc(&eng, &[1, 2]);

    assert_eq!(
        a.try_mul(bound + 1).unwrap_err(),
        Error::PlainOutOfRange {
            value: bound + 1,
            bound
        }
    );
    assert_eq!(
        a.try_add(-(bound + 1)).unwrap_err(),
        Error::PlainOutOfRange {
            value: -(bound + 1),
            bound
        }
    );
}

#[test]
fn slot_accounting_stays_balanced() {
    let eng = demo_engine(32);
    assert_eq!(eng.allocated_slots(), 0);
    {
        let a = enc(&eng, &[1, 2, 3]);
        let b = enc(&eng, &[4, 5, 6]);
        assert_eq!(eng.allocated_slots(), 6);

        let sum = a.try_add(&b).unwrap();
        assert_eq!(eng.allocated_slots(), 9);

        // scalar promotion is transient
        let scaled = sum.try_mul(2).unwrap();
        assert_eq!(eng.allocated_slots(), 12);

        // a refused operation allocates nothing lasting
        let c = enc(&eng, &[1]);
        assert!(a.try_add(&c).is_err());
        assert_eq!(eng.allocated_slots(), 13);

        drop(c);
        assert_eq!(eng.allocated_slots(), 12);
        drop(scaled);
        drop(sum);
        assert_eq!(eng.allocated_slots(), 6);
    }
    assert_eq!(eng.allocated_slots(), 0);
}

#[test]
fn end_to_end_vector_workflow() {
    let eng = demo_engine(33);
    let a = enc(&eng, &[1, 2, 3]);
    let b = enc(&eng, &[10, 20, 30]);

    let scaled = (&a + &b) * 2;
    assert_eq!(eng.decrypt(&scaled).unwrap(), vec![22, 44, 66]);

    let dot = a.try_dot(&b).unwrap();
    assert_eq!(eng.decrypt(&dot).unwrap(), vec![140, 140, 140]);

    let mut acc = a.clone();
    acc += &b;
    acc -= 5;
    acc *= -1;
    assert_eq!(eng.decrypt(&acc).unwrap(), vec![-6, -17, -28]);
}

#[test]
fn noise_budget_refusal_preserves_operands() {
    let eng = Engine::new(Params::narrow().with_seed(34)).expect("valid parameters");
    let mut a = enc(&eng, &[1, 2]);
    let b = enc(&eng, &[2, 1]);

    assert!(matches!(
        a.try_mul_assign(&b),
        Err(Error::NoiseBudget { .. })
    ));
    assert_eq!(eng.decrypt(&a).unwrap(), vec![1, 2]);
    assert_eq!(eng.decrypt(&b).unwrap(), vec![2, 1]);

    // the copy form cleans up its intermediate clone as well
    assert!(matches!(a.try_mul(&b), Err(Error::NoiseBudget { .. })));
    assert_eq!(eng.allocated_slots(), 4);
}

#[test]
fn refused_scalar_operation_releases_its_transient() {
    let eng = Engine::new(Params::narrow().with_seed(37)).expect("valid parameters");
    let mut a = enc(&eng, &[1, 2]);
    let before = eng.allocated_slots();

    // the scalar fits the plain range, so the broadcast is encrypted before
    // the product is refused; the transient goes away with the error
    assert!(matches!(a.try_mul_assign(2), Err(Error::NoiseBudget { .. })));
    assert_eq!(eng.allocated_slots(), before);
    assert_eq!(eng.decrypt(&a).unwrap(), vec![1, 2]);

    // the copy form releases its clone and its transient alike
    assert!(matches!(a.try_mul(2), Err(Error::NoiseBudget { .. })));
    assert_eq!(eng.allocated_slots(), before);
    assert_eq!(eng.decrypt(&a).unwrap(), vec![1, 2]);
}

#[test]
fn clone_then_mutate_leaves_source_alone() {
    let eng = demo_engine(35);
    let a = enc(&eng, &[8, 9]);
    let mut c = a.try_clone().unwrap();
    c.try_add_assign(1).unwrap();

    assert_eq!(eng.decrypt(&c).unwrap(), vec![9, 10]);
    assert_eq!(eng.decrypt(&a).unwrap(), vec![8, 9]);
}

#[test]
fn stale_handles_surface_unknown_slot() {
    let eng = demo_engine(36);
    let a = enc(&eng, &[1, 2]);
    let ids = a.slot_ids().to_vec();
    eng.release_slots(&ids);

    assert!(matches!(eng.decrypt(&a), Err(Error::UnknownSlot { .. })));
}
