use std::alloc::System;
use std::hint::black_box;

use pdf_objects::{KnownName, Obj};
use stats_alloc::{Stats, StatsAlloc};
use stats_alloc_helper::{memory_measured, LockedAllocator};

#[global_allocator]
static GLOBAL: LockedAllocator<System> = LockedAllocator::new(StatsAlloc::system());

fn build_page() -> Obj {
    let page = Obj::new_dict(None, 4);
    let kids = Obj::new_array(None, 2);
    for i in 0..8 {
        kids.array_push_int(i).ok();
    }
    page.dict_put("Type", &Obj::known(KnownName::Page)).ok();
    page.dict_put("Kids", &kids).ok();
    page.dict_put_string("Title", b"allocation check").ok();
    page.dict_put_name("Custom", "NotAKnownName").ok();
    page.dict_putp("Resources/Font/F1", &Obj::new_name("Helvetica")).ok();
    page
}

#[test]
fn test_object_lifetimes_balance_allocations() {
    // Constants are never counted and never allocate.
    let stats = memory_measured(&GLOBAL, || {
        let null = Obj::null();
        let t = Obj::bool(true);
        let name = Obj::known(KnownName::Type);
        black_box((null.keep(), t.keep(), name.keep()));
        null.drop_obj();
        t.drop_obj();
        name.drop_obj();
    });
    assert_eq!(
        stats,
        Stats {
            allocations: 0,
            deallocations: 0,
            reallocations: 0,
            bytes_allocated: 0,
            bytes_deallocated: 0,
            bytes_reallocated: 0,
        }
    );

    // A graph shared by several holders is released with the last one.
    let stats = memory_measured(&GLOBAL, || {
        let page = build_page();
        let extra = page.keep();
        let kids = page.dict_get("Kids").unwrap_or_default();
        assert_eq!(page.ref_count(), 2);
        assert_eq!(kids.ref_count(), 2);
        page.drop_obj();
        assert_eq!(extra.ref_count(), 1);
        black_box(extra.dict_len());
        extra.drop_obj();
        assert_eq!(kids.ref_count(), 1);
        assert_eq!(kids.array_len(), 8);
    });
    assert!(stats.allocations > 0);
    assert_eq!(stats.allocations, stats.deallocations);
    assert_eq!(stats.bytes_allocated, stats.bytes_deallocated);

    // Replacing and deleting entries frees the old values.
    let stats = memory_measured(&GLOBAL, || {
        let page = build_page();
        page.dict_put_drop("Kids", Obj::new_int(0)).ok();
        page.dict_del("Title").ok();
        page.dict_del("Resources").ok();
        black_box(page.dict_len());
    });
    assert_eq!(stats.allocations, stats.deallocations);
}
