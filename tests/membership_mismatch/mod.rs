mod corrupted_descriptor;
mod unreachable_member;
