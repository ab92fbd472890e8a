use std::sync::Arc;

use crate::configs::Storage;
use crate::errors::{HouseError, RoomError};
use crate::models::{House, Room};
use crate::repositories::{HouseRepository, RoomRepository};
use crate::services::DeviceService;

/// Manages the user -> house -> room hierarchy. Devices hang off houses and
/// optionally rooms; removing a room unlinks its devices instead of deleting
/// them.
pub struct HouseholdService {
    storage: Arc<Storage>,
    house_repository: Arc<HouseRepository>,
    room_repository: Arc<RoomRepository>,
    device_service: Arc<DeviceService>,
}

impl HouseholdService {
    pub fn new(
        storage: Arc<Storage>,
        house_repository: Arc<HouseRepository>,
        room_repository: Arc<RoomRepository>,
        device_service: Arc<DeviceService>,
    ) -> Self {
        Self {
            storage,
            house_repository,
            room_repository,
            device_service,
        }
    }

    pub async fn get_house_by_id(&self, house_id: i32) -> Result<House, HouseError> {
        self.house_repository
            .find_by_id(house_id)
            .await?
            .ok_or(HouseError::HouseNotFound)
    }

    pub async fn get_houses_for_user(&self, user_id: i32) -> Result<Vec<House>, HouseError> {
        Ok(self.house_repository.find_by_user_id(user_id).await?)
    }

    pub async fn get_all_houses(&self) -> Result<Vec<House>, HouseError> {
        Ok(self.house_repository.find_all().await?)
    }

    pub async fn add_house(
        &self,
        user_id: i32,
        name: &str,
        location: &str,
    ) -> Result<House, HouseError> {
        let houses = self.house_repository.find_by_user_id(user_id).await?;
        if houses.iter().any(|house| house.name == name) {
            return Err(HouseError::DuplicateName);
        }

        let house = House {
            id: 0,
            user_id,
            name: name.to_string(),
            location: location.to_string(),
        };

        let mut tx = self.storage.get_pool().begin().await?;
        let house_id = self.house_repository.create(&house, &mut tx).await?;
        tx.commit().await?;

        self.get_house_by_id(house_id).await
    }

    pub async fn update_house(
        &self,
        house_id: i32,
        name: &str,
        location: &str,
    ) -> Result<House, HouseError> {
        let house = self.get_house_by_id(house_id).await?;

        let siblings = self.house_repository.find_by_user_id(house.user_id).await?;
        if siblings
            .iter()
            .any(|other| other.id != house_id && other.name == name)
        {
            return Err(HouseError::DuplicateName);
        }

        let updated = House {
            id: house_id,
            user_id: house.user_id,
            name: name.to_string(),
            location: location.to_string(),
        };

        let mut tx = self.storage.get_pool().begin().await?;
        self.house_repository.update(house_id, &updated, &mut tx).await?;
        tx.commit().await?;

        self.get_house_by_id(house_id).await
    }

    /// Rooms and devices inside the house go with it.
    pub async fn remove_house(&self, house_id: i32) -> Result<(), HouseError> {
        let _ = self.get_house_by_id(house_id).await?;

        let mut tx = self.storage.get_pool().begin().await?;
        self.house_repository.delete(house_id, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn get_room_by_id(&self, room_id: i32) -> Result<Room, RoomError> {
        self.room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(RoomError::RoomNotFound)
    }

    pub async fn get_rooms_for_house(&self, house_id: i32) -> Result<Vec<Room>, RoomError> {
        Ok(self.room_repository.find_by_house_id(house_id).await?)
    }

    pub async fn add_room(&self, house_id: i32, name: &str) -> Result<Room, RoomError> {
        let rooms = self.room_repository.find_by_house_id(house_id).await?;
        if rooms.iter().any(|room| room.name == name) {
            return Err(RoomError::DuplicateName);
        }

        let room = Room {
            id: 0,
            house_id,
            name: name.to_string(),
        };

        let mut tx = self.storage.get_pool().begin().await?;
        let room_id = self.room_repository.create(&room, &mut tx).await?;
        tx.commit().await?;

        self.get_room_by_id(room_id).await
    }

    /// Devices in the room survive the removal, unassigned.
    pub async fn remove_room(&self, room_id: i32) -> Result<(), RoomError> {
        let _ = self.get_room_by_id(room_id).await?;

        for device in self.device_service.get_devices_for_room(room_id).await? {
            self.device_service.unlink_device_from_room(device.id).await?;
        }

        let mut tx = self.storage.get_pool().begin().await?;
        self.room_repository.delete(room_id, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }
}
