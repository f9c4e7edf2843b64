pub mod ticket_dto;
