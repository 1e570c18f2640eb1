use plixies_api::db;
use plixies_api::nztime::Shift;
use plixies_api::services::packets::{CreatePacket, PacketService};
use plixies_api::services::pallets::{PalletService, UpdatePallet};
use plixies_api::services::shipments::ShipmentService;
use std::sync::Arc;

fn packet_input(size: i32, thermo: i16) -> CreatePacket {
    CreatePacket {
        size,
        thermoformer_number: thermo,
        shift: None,
        raw_materials: Some("PET 0.5mm clear".to_string()),
        batch_number: Some("240815".to_string()),
        box_number: Some("3".to_string()),
        user_id: None,
    }
}

// Ignored by default: needs a real Postgres database.
// Run with: DATABASE_URL=postgres://... cargo test -- --ignored packet_flow
#[tokio::test]
#[ignore]
async fn packets_fill_a_pallet_and_close_it_at_twenty_four() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let pool = Arc::new(pool);

    let packets = PacketService::new(pool.clone());
    let pallets = PalletService::new(pool.clone());

    let first = packets
        .create_packet(packet_input(22, 1))
        .await
        .expect("first packet");
    assert_eq!(first.packet_index, 1);
    assert!(!first.pallet_closed);

    let mut last = first.clone();
    for _ in 1..24 {
        last = packets
            .create_packet(packet_input(22, 1))
            .await
            .expect("packet");
    }
    assert_eq!(last.packet_index, 24);
    assert!(last.pallet_closed, "slot 24 closes the pallet");
    assert_eq!(last.pallet_number, first.pallet_number);

    let aggregate = pallets
        .aggregate_for(last.packet.pallet_id.expect("placed"))
        .await
        .expect("aggregate");
    assert!(aggregate.complete);
    assert_eq!(aggregate.packets_count, 24);

    // The next packet of the same size opens a fresh pallet at slot 1.
    let next = packets
        .create_packet(packet_input(22, 1))
        .await
        .expect("packet 25");
    assert_eq!(next.packet_index, 1);
    assert_ne!(next.pallet_number, first.pallet_number);
}

#[tokio::test]
#[ignore]
async fn serials_are_independent_per_size() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let pool = Arc::new(pool);

    let packets = PacketService::new(pool.clone());

    let a = packets
        .create_packet(packet_input(22, 1))
        .await
        .expect("size 22");
    let b = packets
        .create_packet(packet_input(25, 2))
        .await
        .expect("size 25");
    let a2 = packets
        .create_packet(packet_input(22, 1))
        .await
        .expect("size 22 again");
    let b2 = packets
        .create_packet(packet_input(25, 2))
        .await
        .expect("size 25 again");

    // Each size advances on its own track, unaffected by the other.
    assert_eq!(a2.packet.iso_number, a.packet.iso_number + 1);
    assert_eq!(b2.packet.iso_number, b.packet.iso_number + 1);
}

#[tokio::test]
#[ignore]
async fn declared_shift_overrides_the_factory_clock() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let pool = Arc::new(pool);

    let packets = PacketService::new(pool.clone());
    let placed = packets
        .create_packet(CreatePacket {
            shift: Some(Shift::Night),
            ..packet_input(22, 1)
        })
        .await
        .expect("packet with declared shift");
    assert_eq!(placed.packet.shift, Shift::Night);
}

#[tokio::test]
#[ignore]
async fn empty_pallet_update_is_a_no_op() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let pool = Arc::new(pool);

    let packets = PacketService::new(pool.clone());
    let pallets = PalletService::new(pool.clone());

    let placed = packets
        .create_packet(packet_input(22, 2))
        .await
        .expect("packet");
    let pallet_id = placed.packet.pallet_id.expect("placed");

    let unchanged = pallets
        .update_pallet(pallet_id, UpdatePallet::default())
        .await
        .expect("empty update succeeds");
    assert_eq!(unchanged.size, 22);
    assert_eq!(unchanged.thermoformer_number, 2);
}

#[tokio::test]
#[ignore]
async fn deleting_a_packet_reopens_its_pallet() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL for ignored test");
    let pool = db::establish_connection(&url).await.expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let pool = Arc::new(pool);

    let packets = PacketService::new(pool.clone());
    let shipments = ShipmentService::new(pool.clone());

    let mut last = packets
        .create_packet(packet_input(25, 2))
        .await
        .expect("packet");
    while !last.pallet_closed {
        last = packets
            .create_packet(packet_input(25, 2))
            .await
            .expect("packet");
    }

    packets
        .delete_packet(last.packet.id)
        .await
        .expect("delete packet");

    // The pallet is no longer complete, so it disappears from shipments and
    // the total reflects only the pallets actually listed.
    let page = shipments
        .list_shipments(1, 10_000)
        .await
        .expect("shipments");
    assert!(page
        .shipments
        .iter()
        .all(|s| s.pallet_number != last.pallet_number));
    assert_eq!(page.total as usize, page.shipments.len());
}
